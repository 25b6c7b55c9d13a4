//! Elasticity bricks: linearized isotropic and hyperelastic.
//!
//! # Weak forms
//!
//! Linearized: `∫Ω σ(u) : ε(v)` with `σ = λ tr(ε) I + 2μ ε`, assembled as
//! `Kₑ = ∫ Bᵀ D B` and residual `Kₑ uₑ`.
//!
//! Nonlinear (total Lagrangian): `∫Ω F S(E) : ∇v` with `F = I + ∇u` and
//! `E = ½(FᵀF − I)`. The consistent tangent in the direction `ΔH` is
//! `ΔH S + F dS[sym(Fᵀ ΔH)]`.

use crate::assembly::assemble_convexes;
use crate::bricks::convex_quadrature;
use crate::element::{displacement_gradient, strain_displacement};
use crate::error::Result;
use crate::hyperelastic::HyperelasticLaw;
use crate::material::isotropic_constitutive;
use crate::model::{expect_len, unknown_param, Brick, BrickContext};
use crate::sparse::LocalContribution;
use crate::types::StrainTensor;
use nalgebra::{DMatrix, DVector, Matrix3};

/// Isotropic linearized elasticity with Lamé coefficients.
#[derive(Debug, Clone)]
pub struct IsotropicLinearizedElasticity {
    lambda: f64,
    mu: f64,
}

impl IsotropicLinearizedElasticity {
    pub fn new(lambda: f64, mu: f64) -> Self {
        Self { lambda, mu }
    }
}

impl Brick for IsotropicLinearizedElasticity {
    fn name(&self) -> &str {
        "isotropic linearized elasticity"
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn is_coercive(&self) -> bool {
        true
    }

    fn param_list(&self) -> Vec<&'static str> {
        vec!["lambda", "mu"]
    }

    fn param(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "lambda" => Ok(vec![self.lambda]),
            "mu" => Ok(vec![self.mu]),
            _ => Err(unknown_param(self, name)),
        }
    }

    fn set_param(&mut self, name: &str, values: &[f64]) -> Result<()> {
        match name {
            "lambda" => {
                expect_len(name, values, &[1])?;
                self.lambda = values[0];
            }
            "mu" => {
                expect_len(name, values, &[1])?;
                self.mu = values[0];
            }
            _ => return Err(unknown_param(self, name)),
        }
        Ok(())
    }

    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>> {
        let mfu = ctx.mfu;
        let mesh = mfu.mesh();
        let d = isotropic_constitutive(self.lambda, self.mu);
        let u = ctx.u();
        let convexes: Vec<usize> = (0..mesh.nbcvs()).collect();

        assemble_convexes(&convexes, |cv| {
            let (geometry, points) = convex_quadrature(ctx.mim, mesh, cv)?;
            let n = mfu.nb_dof_of_convex(cv);
            let mut ke = DMatrix::zeros(n, n);

            // K += Bᵀ D B w |J|
            for (l, w) in &points {
                let b = strain_displacement(&mfu.gradients(&geometry, l));
                let db = &d * &b;
                ke += b.transpose() * db * *w;
            }

            let ue = DVector::from_vec(mfu.local_values(cv, u));
            let re = &ke * ue;
            Ok(LocalContribution::square(mfu.cell_dofs(cv), ke, re))
        })
    }

    fn cauchy_stress(&self, grad_u: &Matrix3<f64>) -> Option<Matrix3<f64>> {
        let eps = StrainTensor::from_displacement_gradient(grad_u);
        Some(Matrix3::identity() * (self.lambda * eps.volumetric()) + eps.to_matrix() * (2.0 * self.mu))
    }
}

/// Hyperelastic large-strain elasticity.
#[derive(Debug, Clone)]
pub struct NonlinearElasticity {
    law: HyperelasticLaw,
}

impl NonlinearElasticity {
    pub fn new(law: HyperelasticLaw) -> Self {
        Self { law }
    }

    /// The constitutive law.
    pub fn law(&self) -> &HyperelasticLaw {
        &self.law
    }
}

impl Brick for NonlinearElasticity {
    fn name(&self) -> &str {
        "nonlinear elasticity"
    }

    fn is_linear(&self) -> bool {
        false
    }

    fn is_coercive(&self) -> bool {
        false
    }

    fn param_list(&self) -> Vec<&'static str> {
        vec!["params"]
    }

    fn param(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "params" => Ok(self.law.params()),
            _ => Err(unknown_param(self, name)),
        }
    }

    fn set_param(&mut self, name: &str, values: &[f64]) -> Result<()> {
        match name {
            "params" => self.law.set_params(values),
            _ => Err(unknown_param(self, name)),
        }
    }

    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>> {
        let mfu = ctx.mfu;
        let mesh = mfu.mesh();
        let u = ctx.u();
        let law = self.law;
        let convexes: Vec<usize> = (0..mesh.nbcvs()).collect();

        assemble_convexes(&convexes, |cv| {
            let (geometry, points) = convex_quadrature(ctx.mim, mesh, cv)?;
            let n = mfu.nb_dof_of_convex(cv);
            let n_nodes = n / 3;
            let ue = mfu.local_values(cv, u);
            let mut ke = DMatrix::zeros(n, n);
            let mut re = DVector::zeros(n);

            for (l, w) in &points {
                let grads = mfu.gradients(&geometry, l);
                let f = Matrix3::identity() + displacement_gradient(&grads, &ue);
                let e = (f.transpose() * f - Matrix3::identity()) * 0.5;
                let s = law.sigma(&e);
                let p = f * s;

                for (a, ga) in grads.iter().enumerate() {
                    let fa = p * ga;
                    for i in 0..3 {
                        re[a * 3 + i] += w * fa[i];
                    }
                }

                for b in 0..n_nodes {
                    for k in 0..3 {
                        let mut dh = Matrix3::zeros();
                        dh.set_row(k, &grads[b].transpose());
                        let de = (f.transpose() * dh + dh.transpose() * f) * 0.5;
                        let dp = dh * s + f * law.grad_sigma(&e, &de);
                        let col = b * 3 + k;
                        for (a, ga) in grads.iter().enumerate() {
                            let v = dp * ga;
                            for i in 0..3 {
                                ke[(a * 3 + i, col)] += w * v[i];
                            }
                        }
                    }
                }
            }

            Ok(LocalContribution::square(mfu.cell_dofs(cv), ke, re))
        })
    }

    fn cauchy_stress(&self, grad_u: &Matrix3<f64>) -> Option<Matrix3<f64>> {
        // σ = J⁻¹ F S Fᵀ
        let f = Matrix3::identity() + grad_u;
        let e = (f.transpose() * f - Matrix3::identity()) * 0.5;
        let j = f.determinant();
        Some(f * self.law.sigma(&e) * f.transpose() / j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bricks::testing::{check_tangent, dense_system, unit_box};
    use crate::types::StressTensor;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_stiffness_symmetric() {
        let (mfu, mim) = unit_box(1, 2);
        let brick = IsotropicLinearizedElasticity::new(577.0, 385.0);
        let (k, _) = dense_system(&brick, &mfu, &mim, &vec![0.0; mfu.nbdof()]);
        assert_relative_eq!(k.clone(), k.transpose(), epsilon = 1e-9);
        for i in 0..k.nrows() {
            assert!(k[(i, i)] > 0.0);
        }
    }

    #[test]
    fn test_rigid_body_modes_have_no_residual() {
        let (mfu, mim) = unit_box(2, 1);
        let brick = IsotropicLinearizedElasticity::new(577.0, 385.0);
        // translation plus infinitesimal rotation about z
        let u: Vec<f64> = (0..mfu.nbdof())
            .map(|d| {
                let x = mfu.dof_coordinates(d);
                match d % 3 {
                    0 => 0.3 - 0.01 * x[1],
                    1 => -0.2 + 0.01 * x[0],
                    _ => 0.1,
                }
            })
            .collect();
        let (_, r) = dense_system(&brick, &mfu, &mim, &u);
        assert!(r.iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn test_uniaxial_stress_law() {
        let brick = IsotropicLinearizedElasticity::new(577.0, 385.0);
        let mut h = Matrix3::zeros();
        h[(0, 0)] = 1e-3;
        let sigma = brick.cauchy_stress(&h).unwrap();
        assert_relative_eq!(sigma[(0, 0)], (577.0 + 2.0 * 385.0) * 1e-3, epsilon = 1e-12);
        assert_relative_eq!(sigma[(1, 1)], 577.0 * 1e-3, epsilon = 1e-12);
        let vm = StressTensor::from_matrix(&sigma).von_mises();
        assert_relative_eq!(vm, 2.0 * 385.0 * 1e-3, epsilon = 1e-12);
    }

    #[test]
    fn test_svk_matches_linear_at_zero() {
        let (mfu, mim) = unit_box(1, 1);
        let zero = vec![0.0; mfu.nbdof()];
        let lin = IsotropicLinearizedElasticity::new(577.0, 385.0);
        let svk = NonlinearElasticity::new(HyperelasticLaw::SaintVenantKirchhoff {
            lambda: 577.0,
            mu: 385.0,
        });
        let (k_lin, _) = dense_system(&lin, &mfu, &mim, &zero);
        let (k_svk, r_svk) = dense_system(&svk, &mfu, &mim, &zero);
        assert_relative_eq!(k_lin, k_svk, epsilon = 1e-9);
        assert!(r_svk.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_nonlinear_tangent_matches_residual() {
        let (mfu, mim) = unit_box(1, 1);
        let u: Vec<f64> = (0..mfu.nbdof())
            .map(|d| 0.05 * ((d as f64) * 0.7).sin())
            .collect();
        for law in [
            HyperelasticLaw::SaintVenantKirchhoff { lambda: 5.0, mu: 3.0 },
            HyperelasticLaw::MooneyRivlin { c1: 5.0, c2: 3.0 },
        ] {
            check_tangent(&NonlinearElasticity::new(law), &mfu, &mim, &u);
        }
    }

    #[test]
    fn test_params() {
        let mut brick = NonlinearElasticity::new("Mooney Rivlin".parse().unwrap());
        brick.set_param("params", &[577.0, 385.0]).unwrap();
        assert_eq!(brick.param("params").unwrap(), vec![577.0, 385.0]);
        assert!(brick.set_param("lambda", &[1.0]).is_err());

        let mut lin = IsotropicLinearizedElasticity::new(0.0, 0.0);
        assert!(lin.set_param("mu", &[1.0, 2.0]).is_err());
    }
}
