//! Gauss quadrature rules for numerical integration.
//!
//! This module provides symmetric quadrature rules for:
//! - Tetrahedral volume integration
//! - Triangular face integration
//!
//! # Usage
//!
//! ```
//! use brickfem_core::element::gauss::{gauss_tet, gauss_tri};
//!
//! // 4-point tetrahedral rule
//! for gp in gauss_tet(4) {
//!     // gp.coords gives (L1, L2, L3, L4) barycentric coordinates
//!     // gp.weight is the integration weight
//!     let _ = (gp.coords, gp.weight);
//! }
//!
//! // 6-point triangle rule
//! let face_area: f64 = gauss_tri(6).iter().map(|gp| gp.weight).sum();
//! assert!((face_area - 0.5).abs() < 1e-12);
//! ```

/// A Gauss quadrature point with natural coordinates and weight.
#[derive(Debug, Clone, Copy)]
pub struct GaussPoint {
    /// Natural coordinates.
    /// - For tetrahedral: [L1, L2, L3, L4] (barycentric, sum=1)
    /// - For triangular: [L1, L2, L3, 0] (area coordinates, sum=1)
    pub coords: [f64; 4],
    /// Integration weight.
    pub weight: f64,
}

impl GaussPoint {
    /// Create a new Gauss point.
    pub fn new(coords: [f64; 4], weight: f64) -> Self {
        Self { coords, weight }
    }
}

/// Tetrahedral Gauss quadrature points.
///
/// Returns integration points for a unit tetrahedron with vertices at:
/// - (0, 0, 0)
/// - (1, 0, 0)
/// - (0, 1, 0)
/// - (0, 0, 1)
///
/// Points are given in barycentric coordinates (L1, L2, L3, L4) where Li ≥ 0 and ΣLi = 1.
///
/// Weights are scaled for the unit tetrahedron (volume = 1/6), so ∫f dV ≈ Σ w_i * f(x_i).
///
/// # Arguments
///
/// * `n` - Number of integration points (1, 4, 5, or 14)
///
/// # Integration Order
///
/// - n=1: Exact for polynomials up to degree 1 (linear)
/// - n=4: Exact for polynomials up to degree 2 (quadratic)
/// - n=5: Exact for polynomials up to degree 3 (cubic)
/// - n=14: Exact for polynomials up to degree 5
///
/// # Panics
///
/// Panics if `n` is not 1, 4, 5, or 14.
pub fn gauss_tet(n: usize) -> Vec<GaussPoint> {
    match n {
        1 => {
            // 1-point rule: centroid
            vec![GaussPoint::new([0.25, 0.25, 0.25, 0.25], 1.0 / 6.0)]
        }
        4 => {
            // 4-point rule (degree 2)
            // Points at (α, β, β, β) and permutations
            // α = (5 + 3√5) / 20 ≈ 0.5854
            // β = (5 - √5) / 20 ≈ 0.1382
            let sqrt5 = 5.0_f64.sqrt();
            let alpha = (5.0 + 3.0 * sqrt5) / 20.0;
            let beta = (5.0 - sqrt5) / 20.0;
            let w = 1.0 / 24.0;
            vertex_orbit(alpha, beta, w)
        }
        5 => {
            // 5-point rule (degree 3)
            // Centroid weight: -4/5 * (1/6) = -2/15
            // Orbit weight: 9/20 * (1/6) = 3/40
            let mut points = vec![GaussPoint::new([0.25, 0.25, 0.25, 0.25], -2.0 / 15.0)];
            points.extend(vertex_orbit(0.5, 1.0 / 6.0, 3.0 / 40.0));
            points
        }
        14 => {
            // 14-point rule (degree 5): two vertex orbits and one edge orbit
            let a1 = 0.092_735_250_310_891_2;
            let w1 = 0.012_248_840_519_393_658;
            let a2 = 0.310_885_919_263_300_6;
            let w2 = 0.018_781_320_953_002_642;
            let b = 0.045_503_704_125_649_6;
            let w3 = 0.007_091_003_462_846_911;

            let mut points = Vec::with_capacity(14);
            points.extend(vertex_orbit(1.0 - 3.0 * a1, a1, w1));
            points.extend(vertex_orbit(1.0 - 3.0 * a2, a2, w2));
            let c = 0.5 - b;
            for &(i, j) in &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
                let mut coords = [b; 4];
                coords[i] = c;
                coords[j] = c;
                points.push(GaussPoint::new(coords, w3));
            }
            points
        }
        _ => panic!("gauss_tet: n must be 1, 4, 5, or 14, got {}", n),
    }
}

/// Points of the form (a, b, b, b) and its permutations.
fn vertex_orbit(a: f64, b: f64, w: f64) -> Vec<GaussPoint> {
    (0..4)
        .map(|k| {
            let mut coords = [b; 4];
            coords[k] = a;
            GaussPoint::new(coords, w)
        })
        .collect()
}

/// Tetrahedral rule exact for polynomials of the given degree.
pub fn gauss_tet_for_degree(degree: usize) -> Vec<GaussPoint> {
    match degree {
        0 | 1 => gauss_tet(1),
        2 => gauss_tet(4),
        3 => gauss_tet(5),
        _ => gauss_tet(14),
    }
}

/// Triangle Gauss quadrature points for face integration.
///
/// Returns integration points for a unit triangle with vertices at (0,0), (1,0), (0,1).
/// Points are given in area coordinates (L1, L2, L3) where Li ≥ 0 and ΣLi = 1.
/// The coords array stores [L1, L2, L3, 0].
///
/// Weights are scaled for the unit triangle (area = 1/2).
///
/// # Arguments
///
/// * `n` - Number of integration points (1, 3, 4, or 6)
///
/// # Panics
///
/// Panics if `n` is not 1, 3, 4, or 6.
pub fn gauss_tri(n: usize) -> Vec<GaussPoint> {
    match n {
        1 => {
            // 1-point rule: centroid, degree 1
            vec![GaussPoint::new([1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0], 0.5)]
        }
        3 => {
            // 3-point rule: edge midpoints, degree 2
            let w = 1.0 / 6.0;
            vec![
                GaussPoint::new([0.5, 0.5, 0.0, 0.0], w),
                GaussPoint::new([0.0, 0.5, 0.5, 0.0], w),
                GaussPoint::new([0.5, 0.0, 0.5, 0.0], w),
            ]
        }
        4 => {
            // 4-point rule: centroid + 3 points, degree 3
            let w_center = -27.0 / 96.0;
            let w_corner = 25.0 / 96.0;
            vec![
                GaussPoint::new([1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0], w_center),
                GaussPoint::new([0.6, 0.2, 0.2, 0.0], w_corner),
                GaussPoint::new([0.2, 0.6, 0.2, 0.0], w_corner),
                GaussPoint::new([0.2, 0.2, 0.6, 0.0], w_corner),
            ]
        }
        6 => {
            // 6-point rule, degree 4
            let a = 0.445_948_490_915_965;
            let wa = 0.5 * 0.223_381_589_678_011;
            let b = 0.091_576_213_509_771;
            let wb = 0.5 * 0.109_951_743_655_322;
            vec![
                GaussPoint::new([1.0 - 2.0 * a, a, a, 0.0], wa),
                GaussPoint::new([a, 1.0 - 2.0 * a, a, 0.0], wa),
                GaussPoint::new([a, a, 1.0 - 2.0 * a, 0.0], wa),
                GaussPoint::new([1.0 - 2.0 * b, b, b, 0.0], wb),
                GaussPoint::new([b, 1.0 - 2.0 * b, b, 0.0], wb),
                GaussPoint::new([b, b, 1.0 - 2.0 * b, 0.0], wb),
            ]
        }
        _ => panic!("gauss_tri: n must be 1, 3, 4, or 6, got {}", n),
    }
}

/// Triangle rule exact for polynomials of the given degree.
pub fn gauss_tri_for_degree(degree: usize) -> Vec<GaussPoint> {
    match degree {
        0 | 1 => gauss_tri(1),
        2 => gauss_tri(3),
        3 => gauss_tri(4),
        _ => gauss_tri(6),
    }
}
