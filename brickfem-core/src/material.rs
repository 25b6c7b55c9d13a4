//! Material property definitions.
//!
//! Isotropic linear elastic materials, described either by Young's modulus
//! and Poisson's ratio or directly by the Lamé coefficients used by the
//! elasticity bricks.

use crate::error::{Error, Result};
use crate::types::ConstitutiveMatrix;
use nalgebra::Matrix6;

/// Material properties for structural analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Young's modulus.
    pub youngs_modulus: f64,
    /// Poisson's ratio (dimensionless).
    pub poissons_ratio: f64,
}

impl Material {
    /// Create a new isotropic linear elastic material.
    ///
    /// # Arguments
    ///
    /// * `youngs_modulus` - Young's modulus E
    /// * `poissons_ratio` - Poisson's ratio ν (dimensionless, -1 < ν < 0.5)
    ///
    /// # Errors
    ///
    /// Returns error if material properties are physically invalid.
    pub fn new(youngs_modulus: f64, poissons_ratio: f64) -> Result<Self> {
        if !(youngs_modulus > 0.0) {
            return Err(Error::InvalidMaterial(
                "Young's modulus must be positive".into(),
            ));
        }
        if poissons_ratio <= -1.0 || poissons_ratio >= 0.5 {
            return Err(Error::InvalidMaterial(
                "Poisson's ratio must be in range (-1, 0.5)".into(),
            ));
        }
        Ok(Self {
            youngs_modulus,
            poissons_ratio,
        })
    }

    /// Recover E and ν from the Lamé coefficients.
    pub fn from_lame(lambda: f64, mu: f64) -> Result<Self> {
        if !(mu > 0.0) || lambda + mu <= 0.0 {
            return Err(Error::InvalidMaterial(format!(
                "Lamé coefficients out of range (lambda = {}, mu = {})",
                lambda, mu
            )));
        }
        let youngs_modulus = mu * (3.0 * lambda + 2.0 * mu) / (lambda + mu);
        let poissons_ratio = lambda / (2.0 * (lambda + mu));
        Self::new(youngs_modulus, poissons_ratio)
    }

    /// Shear modulus G = E / (2(1 + ν)).
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Bulk modulus K = E / (3(1 - 2ν)).
    pub fn bulk_modulus(&self) -> f64 {
        self.youngs_modulus / (3.0 * (1.0 - 2.0 * self.poissons_ratio))
    }

    /// Lamé's first parameter λ = Eν / ((1+ν)(1-2ν)).
    pub fn lame_lambda(&self) -> f64 {
        let e = self.youngs_modulus;
        let nu = self.poissons_ratio;
        e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu))
    }

    /// Lamé's second parameter μ = G (shear modulus).
    pub fn lame_mu(&self) -> f64 {
        self.shear_modulus()
    }

    /// 3D constitutive matrix for isotropic linear elasticity.
    ///
    /// Returns the 6x6 matrix D such that σ = D * ε in Voigt notation.
    pub fn constitutive_3d(&self) -> ConstitutiveMatrix {
        isotropic_constitutive(self.lame_lambda(), self.lame_mu())
    }
}

/// Isotropic constitutive matrix from the Lamé coefficients.
///
/// Engineering shear strains are assumed, so the shear diagonal is μ.
pub fn isotropic_constitutive(lambda: f64, mu: f64) -> ConstitutiveMatrix {
    let c11 = lambda + 2.0 * mu;
    let c12 = lambda;
    let c44 = mu;

    Matrix6::new(
        c11, c12, c12, 0.0, 0.0, 0.0,
        c12, c11, c12, 0.0, 0.0, 0.0,
        c12, c12, c11, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, c44, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, c44, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, c44,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_material_creation() {
        let mat = Material::new(1e3, 0.3).unwrap();
        assert_relative_eq!(mat.youngs_modulus, 1e3);
        assert_relative_eq!(mat.poissons_ratio, 0.3);
    }

    #[test]
    fn test_invalid_youngs_modulus() {
        assert!(Material::new(-100.0, 0.3).is_err());
        assert!(Material::new(0.0, 0.3).is_err());
        assert!(Material::new(f64::NAN, 0.3).is_err());
    }

    #[test]
    fn test_invalid_poissons_ratio() {
        assert!(Material::new(1e3, 0.5).is_err());
        assert!(Material::new(1e3, -1.0).is_err());
        assert!(Material::new(1e3, 0.6).is_err());
    }

    #[test]
    fn test_lame_coefficients() {
        // Tripod demo values: E = 1e3, ν = 0.3
        let mat = Material::new(1e3, 0.3).unwrap();
        assert_relative_eq!(mat.lame_lambda(), 1e3 * 0.3 / (1.3 * 0.4), epsilon = 1e-9);
        assert_relative_eq!(mat.lame_mu(), 1e3 / 2.6, epsilon = 1e-9);
    }

    #[test]
    fn test_from_lame_roundtrip() {
        let mat = Material::new(210.0, 0.25).unwrap();
        let back = Material::from_lame(mat.lame_lambda(), mat.lame_mu()).unwrap();
        assert_relative_eq!(back.youngs_modulus, 210.0, epsilon = 1e-9);
        assert_relative_eq!(back.poissons_ratio, 0.25, epsilon = 1e-12);
        assert!(Material::from_lame(1.0, 0.0).is_err());
    }

    #[test]
    fn test_bulk_modulus() {
        let mat = Material::new(1e3, 0.3).unwrap();
        assert_relative_eq!(mat.bulk_modulus(), 1e3 / 1.2, epsilon = 1e-9);
    }

    #[test]
    fn test_constitutive_matches_textbook_form() {
        let mat = Material::new(200.0, 0.3).unwrap();
        let d = mat.constitutive_3d();
        let e = 200.0;
        let nu = 0.3;
        let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
        assert_relative_eq!(d[(0, 0)], factor * (1.0 - nu), epsilon = 1e-9);
        assert_relative_eq!(d[(0, 1)], factor * nu, epsilon = 1e-9);
        assert_relative_eq!(d[(3, 3)], factor * (1.0 - 2.0 * nu) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_constitutive_symmetry() {
        let d = Material::new(1e3, 0.3).unwrap().constitutive_3d();
        for i in 0..6 {
            for j in 0..6 {
                assert_relative_eq!(d[(i, j)], d[(j, i)], epsilon = 1e-10);
            }
        }
    }
}
