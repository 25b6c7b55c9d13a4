//! 10-node tetrahedron (Tet10) element, the P2 Lagrange basis.
//!
//! - 4 nodes at vertices
//! - 6 nodes at edge midpoints
//! - Quadratic shape functions, linear strain within a convex
//!
//! # Shape Functions
//!
//! Quadratic shape functions in terms of barycentric coordinates (L1, L2, L3, L4):
//! - Corner nodes (1-4): N_i = L_i * (2*L_i - 1)
//! - Midside nodes (5-10): N_ij = 4 * L_i * L_j
//!
//! where L1 + L2 + L3 + L4 = 1.
//!
//! # Node Numbering
//!
//! ```text
//! Vertices:
//!   Node 1: (1, 0, 0, 0)
//!   Node 2: (0, 1, 0, 0)
//!   Node 3: (0, 0, 1, 0)
//!   Node 4: (0, 0, 0, 1)
//!
//! Edge midpoints:
//!   Node 5: midpoint of edge 1-2 = (0.5, 0.5, 0, 0)
//!   Node 6: midpoint of edge 2-3 = (0, 0.5, 0.5, 0)
//!   Node 7: midpoint of edge 1-3 = (0.5, 0, 0.5, 0)
//!   Node 8: midpoint of edge 1-4 = (0.5, 0, 0, 0.5)
//!   Node 9: midpoint of edge 2-4 = (0, 0.5, 0, 0.5)
//!   Node 10: midpoint of edge 3-4 = (0, 0, 0.5, 0.5)
//! ```
//!
//! This is also the node order of quadratic GiD tetrahedra.

use crate::element::Element;

/// Local vertex pairs of the midside nodes 5..10.
pub const TET10_EDGES: [(usize, usize); 6] = [(0, 1), (1, 2), (0, 2), (0, 3), (1, 3), (2, 3)];

/// 10-node tetrahedral element (quadratic tetrahedron).
#[derive(Debug, Clone, Copy, Default)]
pub struct Tet10;

impl Tet10 {
    /// Create a new Tet10 element.
    pub fn new() -> Self {
        Self
    }
}

impl Element for Tet10 {
    fn n_nodes(&self) -> usize {
        10
    }

    fn degree(&self) -> usize {
        2
    }

    fn nodes(&self) -> Vec<[f64; 4]> {
        let mut nodes = Vec::with_capacity(10);
        for k in 0..4 {
            let mut l = [0.0; 4];
            l[k] = 1.0;
            nodes.push(l);
        }
        for &(i, j) in &TET10_EDGES {
            let mut l = [0.0; 4];
            l[i] = 0.5;
            l[j] = 0.5;
            nodes.push(l);
        }
        nodes
    }

    fn shape_functions(&self, l: &[f64; 4]) -> Vec<f64> {
        let [l1, l2, l3, l4] = *l;

        // Corner nodes: N_i = L_i * (2*L_i - 1)
        let n1 = l1 * (2.0 * l1 - 1.0);
        let n2 = l2 * (2.0 * l2 - 1.0);
        let n3 = l3 * (2.0 * l3 - 1.0);
        let n4 = l4 * (2.0 * l4 - 1.0);

        // Midside nodes: N_ij = 4 * L_i * L_j
        let n5 = 4.0 * l1 * l2; // Edge 1-2
        let n6 = 4.0 * l2 * l3; // Edge 2-3
        let n7 = 4.0 * l1 * l3; // Edge 1-3
        let n8 = 4.0 * l1 * l4; // Edge 1-4
        let n9 = 4.0 * l2 * l4; // Edge 2-4
        let n10 = 4.0 * l3 * l4; // Edge 3-4

        vec![n1, n2, n3, n4, n5, n6, n7, n8, n9, n10]
    }

    fn shape_derivatives_barycentric(&self, l: &[f64; 4]) -> [Vec<f64>; 4] {
        let [l1, l2, l3, l4] = *l;

        // dN_corner/dL_i = 4*L_i - 1 if i matches, 0 otherwise
        // dN_midside/dL_i = 4*L_j if edge connects i-j, 0 otherwise
        let dn_dl1 = vec![
            4.0 * l1 - 1.0, 0.0, 0.0, 0.0,
            4.0 * l2, 0.0, 4.0 * l3, 4.0 * l4, 0.0, 0.0,
        ];
        let dn_dl2 = vec![
            0.0, 4.0 * l2 - 1.0, 0.0, 0.0,
            4.0 * l1, 4.0 * l3, 0.0, 0.0, 4.0 * l4, 0.0,
        ];
        let dn_dl3 = vec![
            0.0, 0.0, 4.0 * l3 - 1.0, 0.0,
            0.0, 4.0 * l2, 4.0 * l1, 0.0, 0.0, 4.0 * l4,
        ];
        let dn_dl4 = vec![
            0.0, 0.0, 0.0, 4.0 * l4 - 1.0,
            0.0, 0.0, 0.0, 4.0 * l1, 4.0 * l2, 4.0 * l3,
        ];

        [dn_dl1, dn_dl2, dn_dl3, dn_dl4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_functions_partition_of_unity() {
        let element = Tet10::new();
        let test_points = [
            [0.25, 0.25, 0.25, 0.25],
            [1.0, 0.0, 0.0, 0.0],
            [0.5, 0.5, 0.0, 0.0],
            [0.1, 0.2, 0.3, 0.4],
        ];

        for l in &test_points {
            let sum: f64 = element.shape_functions(l).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_kronecker_property() {
        let element = Tet10::new();
        for (i, node) in element.nodes().iter().enumerate() {
            let n = element.shape_functions(node);
            for (j, &v) in n.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(v, expected, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let element = Tet10::new();
        let l = [0.1, 0.2, 0.3, 0.4];
        let dn = element.shape_derivatives_barycentric(&l);
        let h = 1e-7;
        for k in 0..4 {
            let mut lp = l;
            let mut lm = l;
            lp[k] += h;
            lm[k] -= h;
            let np = element.shape_functions(&lp);
            let nm = element.shape_functions(&lm);
            for i in 0..10 {
                assert_relative_eq!(dn[k][i], (np[i] - nm[i]) / (2.0 * h), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_derivatives_sum_to_zero_along_constraint() {
        // Σ_i N_i = 1 for all L, so Σ_i (dN_i/dL2 - dN_i/dL1) = 0
        let element = Tet10::new();
        let dn = element.shape_derivatives_barycentric(&[0.1, 0.2, 0.3, 0.4]);
        for k in 1..4 {
            let s: f64 = (0..10).map(|i| dn[k][i] - dn[0][i]).sum();
            assert_relative_eq!(s, 0.0, epsilon = 1e-14);
        }
    }
}
