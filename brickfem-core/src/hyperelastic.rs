//! Hyperelastic constitutive laws for the nonlinear elasticity brick.
//!
//! Laws are written in the reference configuration: they map the
//! Green-Lagrange strain `E = ½(FᵀF − I)` to the second Piola-Kirchhoff
//! stress `S`, and provide the directional derivative `dS[ΔE]` used by the
//! consistent tangent.

use crate::error::{Error, Result};
use nalgebra::Matrix3;
use std::fmt;
use std::str::FromStr;

/// Supported hyperelastic laws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HyperelasticLaw {
    /// `S = λ tr(E) I + 2μ E`. Parameters `[λ, μ]`.
    SaintVenantKirchhoff { lambda: f64, mu: f64 },
    /// `W = c1 (I1 − 3) + c2 (I2 − 3)` on `C = I + 2E`. Parameters `[c1, c2]`.
    ///
    /// The reference configuration is not stress free, so the law is meant
    /// to be paired with an incompressibility term whose pressure absorbs
    /// the hydrostatic part.
    MooneyRivlin { c1: f64, c2: f64 },
}

impl HyperelasticLaw {
    /// Number of scalar parameters the law takes.
    pub fn n_params(&self) -> usize {
        2
    }

    /// Current parameters in `set_params` order.
    pub fn params(&self) -> Vec<f64> {
        match *self {
            HyperelasticLaw::SaintVenantKirchhoff { lambda, mu } => vec![lambda, mu],
            HyperelasticLaw::MooneyRivlin { c1, c2 } => vec![c1, c2],
        }
    }

    /// Replace the parameters.
    pub fn set_params(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.n_params() {
            return Err(Error::InvalidParameter(format!(
                "{} expects {} parameters, got {}",
                self,
                self.n_params(),
                values.len()
            )));
        }
        match self {
            HyperelasticLaw::SaintVenantKirchhoff { lambda, mu } => {
                *lambda = values[0];
                *mu = values[1];
            }
            HyperelasticLaw::MooneyRivlin { c1, c2 } => {
                *c1 = values[0];
                *c2 = values[1];
            }
        }
        Ok(())
    }

    /// Strain energy density W(E).
    pub fn strain_energy(&self, e: &Matrix3<f64>) -> f64 {
        match *self {
            HyperelasticLaw::SaintVenantKirchhoff { lambda, mu } => {
                let tr = e.trace();
                0.5 * lambda * tr * tr + mu * e.component_mul(e).sum()
            }
            HyperelasticLaw::MooneyRivlin { c1, c2 } => {
                let c = Matrix3::identity() + 2.0 * e;
                let i1 = c.trace();
                let i2 = 0.5 * (i1 * i1 - (c * c).trace());
                c1 * (i1 - 3.0) + c2 * (i2 - 3.0)
            }
        }
    }

    /// Second Piola-Kirchhoff stress S(E).
    pub fn sigma(&self, e: &Matrix3<f64>) -> Matrix3<f64> {
        let id = Matrix3::identity();
        match *self {
            HyperelasticLaw::SaintVenantKirchhoff { lambda, mu } => {
                id * (lambda * e.trace()) + e * (2.0 * mu)
            }
            HyperelasticLaw::MooneyRivlin { c1, c2 } => {
                let c = id + 2.0 * e;
                id * (2.0 * (c1 + c2 * c.trace())) - c * (2.0 * c2)
            }
        }
    }

    /// Directional derivative of S at E in the direction ΔE.
    pub fn grad_sigma(&self, _e: &Matrix3<f64>, de: &Matrix3<f64>) -> Matrix3<f64> {
        let id = Matrix3::identity();
        match *self {
            HyperelasticLaw::SaintVenantKirchhoff { lambda, mu } => {
                id * (lambda * de.trace()) + de * (2.0 * mu)
            }
            HyperelasticLaw::MooneyRivlin { c2, .. } => {
                id * (4.0 * c2 * de.trace()) - de * (4.0 * c2)
            }
        }
    }
}

impl fmt::Display for HyperelasticLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HyperelasticLaw::SaintVenantKirchhoff { .. } => write!(f, "SaintVenant Kirchhoff"),
            HyperelasticLaw::MooneyRivlin { .. } => write!(f, "Mooney Rivlin"),
        }
    }
}

/// Parses the law names used in model scripts; parameters start at zero.
impl FromStr for HyperelasticLaw {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "saintvenantkirchhoff" | "svk" => Ok(HyperelasticLaw::SaintVenantKirchhoff {
                lambda: 0.0,
                mu: 0.0,
            }),
            "mooneyrivlin" => Ok(HyperelasticLaw::MooneyRivlin { c1: 0.0, c2: 0.0 }),
            _ => Err(Error::InvalidParameter(format!(
                "unknown hyperelastic law '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_strain() -> Matrix3<f64> {
        Matrix3::new(
            0.02, 0.005, -0.01,
            0.005, -0.03, 0.004,
            -0.01, 0.004, 0.015,
        )
    }

    fn check_sigma_is_energy_gradient(law: HyperelasticLaw) {
        // S = ∂W/∂E, checked by central differences on symmetric directions
        let e = sample_strain();
        let s = law.sigma(&e);
        let h = 1e-6;
        for i in 0..3 {
            for j in i..3 {
                let mut de = Matrix3::zeros();
                de[(i, j)] = 1.0;
                de[(j, i)] = 1.0;
                let dw = (law.strain_energy(&(e + de * h)) - law.strain_energy(&(e - de * h)))
                    / (2.0 * h);
                assert_relative_eq!(dw, s.component_mul(&de).sum(), epsilon = 1e-5);
            }
        }
    }

    fn check_tangent(law: HyperelasticLaw) {
        let e = sample_strain();
        let de = Matrix3::new(
            0.3, 0.1, 0.0,
            0.1, -0.2, 0.05,
            0.0, 0.05, 0.4,
        );
        let h = 1e-6;
        let fd = (law.sigma(&(e + de * h)) - law.sigma(&(e - de * h))) / (2.0 * h);
        let exact = law.grad_sigma(&e, &de);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(fd[(i, j)], exact[(i, j)], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_svk_zero_strain_is_stress_free() {
        let law = HyperelasticLaw::SaintVenantKirchhoff { lambda: 577.0, mu: 385.0 };
        assert_relative_eq!(law.sigma(&Matrix3::zeros()).norm(), 0.0);
    }

    #[test]
    fn test_svk_consistency() {
        let law = HyperelasticLaw::SaintVenantKirchhoff { lambda: 577.0, mu: 385.0 };
        check_sigma_is_energy_gradient(law);
        check_tangent(law);
    }

    #[test]
    fn test_mooney_rivlin_consistency() {
        let law = HyperelasticLaw::MooneyRivlin { c1: 577.0, c2: 385.0 };
        check_sigma_is_energy_gradient(law);
        check_tangent(law);
    }

    #[test]
    fn test_mooney_rivlin_reference_stress_is_hydrostatic() {
        let law = HyperelasticLaw::MooneyRivlin { c1: 2.0, c2: 1.0 };
        let s = law.sigma(&Matrix3::zeros());
        assert_relative_eq!(s, Matrix3::identity() * (2.0 * (2.0 + 2.0 * 1.0)));
    }

    #[test]
    fn test_parse_law_names() {
        assert!(matches!(
            "SaintVenant Kirchhoff".parse::<HyperelasticLaw>().unwrap(),
            HyperelasticLaw::SaintVenantKirchhoff { .. }
        ));
        assert!(matches!(
            "Mooney Rivlin".parse::<HyperelasticLaw>().unwrap(),
            HyperelasticLaw::MooneyRivlin { .. }
        ));
        assert!("Ciarlet Geymonat".parse::<HyperelasticLaw>().is_err());
    }

    #[test]
    fn test_set_params_checks_length() {
        let mut law: HyperelasticLaw = "Mooney Rivlin".parse().unwrap();
        assert!(law.set_params(&[1.0]).is_err());
        law.set_params(&[3.0, 4.0]).unwrap();
        assert_eq!(law.params(), vec![3.0, 4.0]);
    }
}
