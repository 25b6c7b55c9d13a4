//! One-node tetrahedron (Tet1), the P0 Lagrange basis.
//!
//! A single shape function equal to one, attached to the barycentre. Used
//! for piecewise constant pressures and data fields.

use crate::element::Element;

/// Piecewise constant element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tet1;

impl Tet1 {
    /// Create a new Tet1 element.
    pub fn new() -> Self {
        Self
    }
}

impl Element for Tet1 {
    fn n_nodes(&self) -> usize {
        1
    }

    fn degree(&self) -> usize {
        0
    }

    fn nodes(&self) -> Vec<[f64; 4]> {
        vec![[0.25; 4]]
    }

    fn shape_functions(&self, _l: &[f64; 4]) -> Vec<f64> {
        vec![1.0]
    }

    fn shape_derivatives_barycentric(&self, _l: &[f64; 4]) -> [Vec<f64>; 4] {
        [vec![0.0], vec![0.0], vec![0.0], vec![0.0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_basis() {
        let element = Tet1::new();
        assert_eq!(element.n_nodes(), 1);
        assert_eq!(element.shape_functions(&[0.7, 0.1, 0.1, 0.1]), vec![1.0]);
        assert!(element
            .shape_derivatives_barycentric(&[0.25; 4])
            .iter()
            .all(|d| d[0] == 0.0));
    }
}
