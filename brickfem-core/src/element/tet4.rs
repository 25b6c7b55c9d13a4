//! 4-node tetrahedron (Tet4) element, the P1 Lagrange basis.
//!
//! - 4 nodes at vertices
//! - Constant gradients, hence constant strain/stress within a convex
//!
//! # Shape Functions
//!
//! Linear shape functions in terms of barycentric coordinates (L1, L2, L3, L4):
//! - N_i = L_i where sum(L_i) = 1
//!
//! # Limitations
//!
//! - Volumetric locking in nearly incompressible materials (ν → 0.5)
//! - Not inf-sup stable with a piecewise constant pressure

use crate::element::Element;

/// 4-node tetrahedral element (constant strain tetrahedron).
#[derive(Debug, Clone, Copy, Default)]
pub struct Tet4;

impl Tet4 {
    /// Create a new Tet4 element.
    pub fn new() -> Self {
        Self
    }
}

impl Element for Tet4 {
    fn n_nodes(&self) -> usize {
        4
    }

    fn degree(&self) -> usize {
        1
    }

    fn nodes(&self) -> Vec<[f64; 4]> {
        vec![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    fn shape_functions(&self, l: &[f64; 4]) -> Vec<f64> {
        l.to_vec()
    }

    fn shape_derivatives_barycentric(&self, _l: &[f64; 4]) -> [Vec<f64>; 4] {
        // dN_i/dL_k = δ_ik
        [
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Geometry;
    use crate::types::Point3;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_partition_of_unity() {
        let n = Tet4::new().shape_functions(&[0.1, 0.2, 0.3, 0.4]);
        assert_relative_eq!(n.iter().sum::<f64>(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_kronecker_property() {
        let element = Tet4::new();
        for (i, node) in element.nodes().iter().enumerate() {
            let n = element.shape_functions(node);
            for (j, &v) in n.iter().enumerate() {
                assert_relative_eq!(v, if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_unit_tet_gradients() {
        // Unit tet: ∇N1 = (-1,-1,-1), ∇N2 = e_x, ∇N3 = e_y, ∇N4 = e_z
        let g = Geometry::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let grads = g.gradients(&Tet4::new(), &[0.25; 4]);
        assert_relative_eq!(grads[0], Vector3::new(-1.0, -1.0, -1.0), epsilon = 1e-14);
        assert_relative_eq!(grads[1], Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-14);
        assert_relative_eq!(grads[2], Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-14);
        assert_relative_eq!(grads[3], Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-14);
    }
}
