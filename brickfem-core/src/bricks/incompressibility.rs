//! Incompressibility bricks with a pressure multiplier.
//!
//! Both bricks add a scalar pressure `p` on their own mesh fem, stored
//! after the displacement in the global unknown vector.
//!
//! Linear: `∫ p div v + ∫ q div u − ε ∫ p q`.
//!
//! Nonlinear: `∫ p cof(F) : ∇v + ∫ q (det F − 1)`, with the tangent using
//! `d(cof F)[ΔH] = J ((F⁻ᵀ : ΔH) F⁻ᵀ − F⁻ᵀ ΔHᵀ F⁻ᵀ)`.

use crate::assembly::assemble_convexes;
use crate::bricks::convex_quadrature;
use crate::element::displacement_gradient;
use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::model::{expect_len, unknown_param, Brick, BrickContext};
use crate::sparse::LocalContribution;
use nalgebra::{DMatrix, DVector, Matrix3};
use std::sync::Arc;

fn check_pressure_fem(mfp: &MeshFem) -> Result<()> {
    if mfp.qdim() != 1 {
        return Err(Error::Brick(format!(
            "the pressure fem must be scalar, got qdim {}",
            mfp.qdim()
        )));
    }
    Ok(())
}

/// Rows of a convex: displacement dofs, then pressure dofs shifted to the
/// brick's offset.
fn coupled_dofs(mfu: &MeshFem, mfp: &MeshFem, cv: usize, offset: usize) -> Vec<usize> {
    let mut dofs = mfu.cell_dofs(cv);
    dofs.extend(mfp.cell_dofs(cv).into_iter().map(|d| offset + d));
    dofs
}

/// Linearized incompressibility (or nearly incompressible when `ε > 0`).
#[derive(Debug, Clone)]
pub struct LinearIncompressibility {
    mfp: Arc<MeshFem>,
    epsilon: f64,
}

impl LinearIncompressibility {
    /// Pressure on the scalar fem `mfp`.
    pub fn new(mfp: Arc<MeshFem>) -> Self {
        Self { mfp, epsilon: 0.0 }
    }

    /// Penalized variant `div u = ε p`.
    pub fn with_epsilon(mfp: Arc<MeshFem>, epsilon: f64) -> Self {
        Self { mfp, epsilon }
    }
}

impl Brick for LinearIncompressibility {
    fn name(&self) -> &str {
        "linear incompressibility"
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn is_coercive(&self) -> bool {
        false
    }

    fn mixed_variable(&self) -> Option<&MeshFem> {
        Some(self.mfp.as_ref())
    }

    fn param_list(&self) -> Vec<&'static str> {
        vec!["epsilon"]
    }

    fn param(&self, name: &str) -> Result<Vec<f64>> {
        match name {
            "epsilon" => Ok(vec![self.epsilon]),
            _ => Err(unknown_param(self, name)),
        }
    }

    fn set_param(&mut self, name: &str, values: &[f64]) -> Result<()> {
        match name {
            "epsilon" => {
                expect_len(name, values, &[1])?;
                self.epsilon = values[0];
                Ok(())
            }
            _ => Err(unknown_param(self, name)),
        }
    }

    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>> {
        check_pressure_fem(&self.mfp)?;
        let mfu = ctx.mfu;
        let mfp = self.mfp.as_ref();
        let mesh = mfu.mesh();
        let convexes: Vec<usize> = (0..mesh.nbcvs()).collect();

        assemble_convexes(&convexes, |cv| {
            let (geometry, points) = convex_quadrature(ctx.mim, mesh, cv)?;
            let nu = mfu.nb_dof_of_convex(cv);
            let np = mfp.nb_dof_of_convex(cv);
            let mut ke = DMatrix::zeros(nu + np, nu + np);

            for (l, w) in &points {
                let grads = mfu.gradients(&geometry, l);
                let psi = mfp.shape_functions(l);
                for (q, &pq) in psi.iter().enumerate() {
                    for (a, ga) in grads.iter().enumerate() {
                        for i in 0..3 {
                            let b = w * pq * ga[i];
                            ke[(nu + q, a * 3 + i)] += b;
                            ke[(a * 3 + i, nu + q)] += b;
                        }
                    }
                    if self.epsilon != 0.0 {
                        for (r, &pr) in psi.iter().enumerate() {
                            ke[(nu + q, nu + r)] -= w * self.epsilon * pq * pr;
                        }
                    }
                }
            }

            let dofs = coupled_dofs(mfu, mfp, cv, ctx.mixed_offset);
            let values = DVector::from_iterator(dofs.len(), dofs.iter().map(|&d| ctx.state[d]));
            let re = &ke * values;
            Ok(LocalContribution::square(dofs, ke, re))
        })
    }
}

/// Large strain incompressibility `det F = 1`.
#[derive(Debug, Clone)]
pub struct NonlinearIncompressibility {
    mfp: Arc<MeshFem>,
}

impl NonlinearIncompressibility {
    pub fn new(mfp: Arc<MeshFem>) -> Self {
        Self { mfp }
    }
}

impl Brick for NonlinearIncompressibility {
    fn name(&self) -> &str {
        "nonlinear incompressibility"
    }

    fn is_linear(&self) -> bool {
        false
    }

    fn is_coercive(&self) -> bool {
        false
    }

    fn mixed_variable(&self) -> Option<&MeshFem> {
        Some(self.mfp.as_ref())
    }

    fn param_list(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn param(&self, name: &str) -> Result<Vec<f64>> {
        Err(unknown_param(self, name))
    }

    fn set_param(&mut self, name: &str, _values: &[f64]) -> Result<()> {
        Err(unknown_param(self, name))
    }

    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>> {
        check_pressure_fem(&self.mfp)?;
        let mfu = ctx.mfu;
        let mfp = self.mfp.as_ref();
        let mesh = mfu.mesh();
        let u = ctx.u();
        let p = ctx.mixed(mfp.nbdof());
        let convexes: Vec<usize> = (0..mesh.nbcvs()).collect();

        assemble_convexes(&convexes, |cv| {
            let (geometry, points) = convex_quadrature(ctx.mim, mesh, cv)?;
            let nu = mfu.nb_dof_of_convex(cv);
            let np = mfp.nb_dof_of_convex(cv);
            let ue = mfu.local_values(cv, u);
            let pe = mfp.local_values(cv, p);
            let mut ke = DMatrix::zeros(nu + np, nu + np);
            let mut re = DVector::zeros(nu + np);

            for (l, w) in &points {
                let grads = mfu.gradients(&geometry, l);
                let psi = mfp.shape_functions(l);
                let pressure: f64 = psi.iter().zip(&pe).map(|(s, v)| s * v).sum();

                let f = Matrix3::identity() + displacement_gradient(&grads, &ue);
                let j = f.determinant();
                let f_inv_t = f
                    .try_inverse()
                    .ok_or_else(|| {
                        Error::Brick(format!("degenerate deformation gradient in convex {}", cv))
                    })?
                    .transpose();
                let cof = f_inv_t * j;

                let cof_grads: Vec<_> = grads.iter().map(|g| cof * g).collect();

                for (a, cg) in cof_grads.iter().enumerate() {
                    for i in 0..3 {
                        re[a * 3 + i] += w * pressure * cg[i];
                    }
                }
                for (q, &pq) in psi.iter().enumerate() {
                    re[nu + q] += w * pq * (j - 1.0);
                    for (a, cg) in cof_grads.iter().enumerate() {
                        for i in 0..3 {
                            let v = w * pq * cg[i];
                            ke[(a * 3 + i, nu + q)] += v;
                            ke[(nu + q, a * 3 + i)] += v;
                        }
                    }
                }

                if pressure != 0.0 {
                    for (b, gb) in grads.iter().enumerate() {
                        for k in 0..3 {
                            let mut dh = Matrix3::zeros();
                            dh.set_row(k, &gb.transpose());
                            let trace = f_inv_t.component_mul(&dh).sum();
                            let dcof = (f_inv_t * trace - f_inv_t * dh.transpose() * f_inv_t) * j;
                            for (a, ga) in grads.iter().enumerate() {
                                let v = dcof * ga;
                                for i in 0..3 {
                                    ke[(a * 3 + i, b * 3 + k)] += w * pressure * v[i];
                                }
                            }
                        }
                    }
                }
            }

            let dofs = coupled_dofs(mfu, mfp, cv, ctx.mixed_offset);
            Ok(LocalContribution::square(dofs, ke, re))
        })
    }
}
