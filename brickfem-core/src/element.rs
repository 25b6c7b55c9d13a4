//! Reference elements and affine tetrahedral geometry.
//!
//! The [`Element`] trait describes a scalar Lagrange element on the reference
//! tetrahedron in barycentric coordinates (L1, L2, L3, L4). Vector fields use
//! one copy of the scalar basis per component. [`Geometry`] maps the reference
//! tetrahedron onto a mesh convex and turns barycentric derivatives into
//! physical gradients.
//!
//! # Submodules
//!
//! - [`gauss`] - Gauss quadrature rules for numerical integration

use crate::error::{Error, Result};
use crate::types::Point3;
use nalgebra::{DMatrix, Matrix3, Vector3};

pub mod constant;
pub mod gauss;
pub mod tet10;
pub mod tet4;

pub use constant::Tet1;
pub use gauss::{gauss_tet, gauss_tet_for_degree, gauss_tri, gauss_tri_for_degree, GaussPoint};
pub use tet10::Tet10;
pub use tet4::Tet4;

/// Scalar Lagrange element on the reference tetrahedron.
///
/// Elements must be thread-safe (Send + Sync) to enable parallel assembly.
pub trait Element: Send + Sync + std::fmt::Debug {
    /// Number of nodes (scalar basis functions).
    fn n_nodes(&self) -> usize;

    /// Polynomial degree of the basis.
    fn degree(&self) -> usize;

    /// Barycentric coordinates of the nodes.
    fn nodes(&self) -> Vec<[f64; 4]>;

    /// Shape function values at a barycentric point.
    fn shape_functions(&self, l: &[f64; 4]) -> Vec<f64>;

    /// Derivatives of the shape functions with respect to each barycentric
    /// coordinate, organised as `[dN/dL1, dN/dL2, dN/dL3, dN/dL4]`.
    fn shape_derivatives_barycentric(&self, l: &[f64; 4]) -> [Vec<f64>; 4];
}

/// The Lagrange element of the given degree.
pub fn create_element(degree: usize) -> Result<&'static dyn Element> {
    match degree {
        0 => Ok(&Tet1),
        1 => Ok(&Tet4),
        2 => Ok(&Tet10),
        _ => Err(Error::Fem(format!(
            "Lagrange elements of degree {} are not available (0, 1 or 2)",
            degree
        ))),
    }
}

/// Affine map from the reference tetrahedron onto a mesh convex.
///
/// Vertex `k` of the convex has barycentric coordinate `L(k+1) = 1`.
#[derive(Debug, Clone)]
pub struct Geometry {
    vertices: [Point3; 4],
    /// J_rc = ∂x_c/∂ξ_r with (ξ, η, ζ) = (L2, L3, L4).
    jacobian: Matrix3<f64>,
    inverse: Matrix3<f64>,
    det: f64,
}

impl Geometry {
    /// Build the map from the four vertex coordinates.
    ///
    /// Both orientations are accepted; degenerate convexes are rejected.
    pub fn new(vertices: [Point3; 4]) -> Result<Self> {
        let [x1, x2, x3, x4] = vertices;
        let e1 = x2 - x1;
        let e2 = x3 - x1;
        let e3 = x4 - x1;
        let jacobian = Matrix3::from_rows(&[e1.transpose(), e2.transpose(), e3.transpose()]);
        let det = jacobian.determinant();

        let scale = e1.norm().max(e2.norm()).max(e3.norm());
        if !(det.abs() > 1e-14 * scale.powi(3)) {
            return Err(Error::Mesh(format!(
                "degenerate tetrahedron (Jacobian determinant {:e})",
                det
            )));
        }
        let inverse = jacobian
            .try_inverse()
            .ok_or_else(|| Error::Mesh("Jacobian is singular".into()))?;

        Ok(Self {
            vertices,
            jacobian,
            inverse,
            det,
        })
    }

    /// Signed Jacobian determinant (six times the signed volume).
    pub fn det(&self) -> f64 {
        self.det
    }

    /// Convex volume.
    pub fn volume(&self) -> f64 {
        self.det.abs() / 6.0
    }

    /// The Jacobian matrix.
    pub fn jacobian(&self) -> &Matrix3<f64> {
        &self.jacobian
    }

    /// Physical position of a barycentric point.
    pub fn map(&self, l: &[f64; 4]) -> Point3 {
        self.vertices
            .iter()
            .zip(l.iter())
            .fold(Point3::zeros(), |acc, (x, &li)| acc + x * li)
    }

    /// Barycentric coordinates of a physical point.
    pub fn barycentric(&self, x: &Point3) -> [f64; 4] {
        // x - x1 = Jᵀ [ξ, η, ζ]ᵀ
        let xi = self.inverse.transpose() * (x - self.vertices[0]);
        [1.0 - xi.sum(), xi[0], xi[1], xi[2]]
    }

    /// Physical gradients of the shape functions of `element` at `l`.
    pub fn gradients(&self, element: &dyn Element, l: &[f64; 4]) -> Vec<Vector3<f64>> {
        let dn_dl = element.shape_derivatives_barycentric(l);
        (0..element.n_nodes())
            .map(|i| {
                // dN/dξ = dN/dL2 - dN/dL1, etc.
                let dn_dnat = Vector3::new(
                    dn_dl[1][i] - dn_dl[0][i],
                    dn_dl[2][i] - dn_dl[0][i],
                    dn_dl[3][i] - dn_dl[0][i],
                );
                self.inverse * dn_dnat
            })
            .collect()
    }

    /// Area of local face `face` (the face opposite vertex `face`).
    pub fn face_area(&self, face: usize) -> f64 {
        let [a, b, c] = face_vertices(face);
        let (xa, xb, xc) = (self.vertices[a], self.vertices[b], self.vertices[c]);
        0.5 * (xb - xa).cross(&(xc - xa)).norm()
    }
}

/// Local vertices of face `face`, in increasing order.
pub fn face_vertices(face: usize) -> [usize; 3] {
    match face {
        0 => [1, 2, 3],
        1 => [0, 2, 3],
        2 => [0, 1, 3],
        _ => [0, 1, 2],
    }
}

/// Lift a triangle area coordinate onto local face `face` of the tetrahedron.
pub fn face_to_barycentric(face: usize, t: &[f64; 4]) -> [f64; 4] {
    let mut l = [0.0; 4];
    for (k, &v) in face_vertices(face).iter().enumerate() {
        l[v] = t[k];
    }
    l
}

/// Displacement gradient `∂u_i/∂x_j` from interleaved nodal values.
pub fn displacement_gradient(gradients: &[Vector3<f64>], u: &[f64]) -> Matrix3<f64> {
    let mut g = Matrix3::zeros();
    for (a, grad) in gradients.iter().enumerate() {
        for i in 0..3 {
            let ua = u[a * 3 + i];
            for j in 0..3 {
                g[(i, j)] += ua * grad[j];
            }
        }
    }
    g
}

/// Compute the B-matrix (strain-displacement) from shape function gradients.
///
/// Returns the 6×(3n) matrix with ε = [ε_xx, ε_yy, ε_zz, γ_xy, γ_yz, γ_xz]ᵀ = B * u.
pub fn strain_displacement(gradients: &[Vector3<f64>]) -> DMatrix<f64> {
    let mut b = DMatrix::zeros(6, 3 * gradients.len());

    for (i, g) in gradients.iter().enumerate() {
        let (dn_dx, dn_dy, dn_dz) = (g[0], g[1], g[2]);
        let col = i * 3; // Starting column for node i

        // ε_xx = ∂u/∂x
        b[(0, col)] = dn_dx;

        // ε_yy = ∂v/∂y
        b[(1, col + 1)] = dn_dy;

        // ε_zz = ∂w/∂z
        b[(2, col + 2)] = dn_dz;

        // γ_xy = ∂u/∂y + ∂v/∂x
        b[(3, col)] = dn_dy;
        b[(3, col + 1)] = dn_dx;

        // γ_yz = ∂v/∂z + ∂w/∂y
        b[(4, col + 1)] = dn_dz;
        b[(4, col + 2)] = dn_dy;

        // γ_xz = ∂u/∂z + ∂w/∂x
        b[(5, col)] = dn_dz;
        b[(5, col + 2)] = dn_dx;
    }

    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_geometry() -> Geometry {
        Geometry::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap()
    }

    fn skewed_geometry() -> Geometry {
        Geometry::new([
            Point3::new(0.1, -0.2, 0.3),
            Point3::new(2.0, 0.1, 0.0),
            Point3::new(0.4, 1.5, -0.2),
            Point3::new(0.2, 0.3, 1.7),
        ])
        .unwrap()
    }

    #[test]
    fn test_unit_tet_volume() {
        assert_relative_eq!(unit_geometry().volume(), 1.0 / 6.0, epsilon = 1e-14);
    }

    #[test]
    fn test_inverted_tet_has_positive_volume() {
        let g = Geometry::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        assert!(g.det() < 0.0);
        assert_relative_eq!(g.volume(), 1.0 / 6.0, epsilon = 1e-14);
    }

    #[test]
    fn test_degenerate_tet_rejected() {
        let result = Geometry::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_map_and_barycentric_are_inverse() {
        let g = skewed_geometry();
        let l = [0.1, 0.2, 0.3, 0.4];
        let x = g.map(&l);
        let back = g.barycentric(&x);
        for k in 0..4 {
            assert_relative_eq!(back[k], l[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gradients_reproduce_linear_field() {
        // Interpolating f(x) = 2x - y + 3z with any element reproduces ∇f
        let g = skewed_geometry();
        let f = |p: &Point3| 2.0 * p[0] - p[1] + 3.0 * p[2];
        for degree in 1..=2 {
            let element = create_element(degree).unwrap();
            let values: Vec<f64> = element.nodes().iter().map(|l| f(&g.map(l))).collect();
            let grads = g.gradients(element, &[0.3, 0.2, 0.1, 0.4]);
            let grad_f = grads
                .iter()
                .zip(values.iter())
                .fold(Vector3::zeros(), |acc, (gr, v)| acc + gr * *v);
            assert_relative_eq!(grad_f, Vector3::new(2.0, -1.0, 3.0), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_face_area_and_lift() {
        let g = unit_geometry();
        assert_relative_eq!(g.face_area(3), 0.5, epsilon = 1e-14);
        assert_relative_eq!(g.face_area(0), 3.0_f64.sqrt() / 2.0, epsilon = 1e-14);
        let l = face_to_barycentric(1, &[0.2, 0.3, 0.5, 0.0]);
        assert_eq!(l, [0.2, 0.0, 0.3, 0.5]);
    }

    #[test]
    fn test_strain_displacement_shape() {
        let g = unit_geometry();
        let element = create_element(1).unwrap();
        let b = strain_displacement(&g.gradients(element, &[0.25; 4]));
        assert_eq!(b.nrows(), 6);
        assert_eq!(b.ncols(), 12);
    }

    #[test]
    fn test_unsupported_degree() {
        assert!(create_element(3).is_err());
    }
}
