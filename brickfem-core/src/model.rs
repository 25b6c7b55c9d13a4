//! Brick-based model composition.
//!
//! A [`Model`] owns the displacement mesh fem, an integration method and a
//! chain of [`Brick`]s. Each brick adds one physical term (a material law, a
//! constraint, a load) on top of its predecessors. The global unknown vector
//! holds the displacement first, then the mixed variables (pressures) of the
//! bricks that declare one, in chain order.

use crate::assembly::AssembledSystem;
use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::integration::MeshIm;
use crate::solve::SolveReport;
use crate::sparse::LocalContribution;
use nalgebra::Matrix3;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Index of a brick in its model.
pub type BrickId = usize;

/// What a brick sees during assembly.
#[derive(Clone, Copy)]
pub struct BrickContext<'a> {
    /// Displacement space.
    pub mfu: &'a MeshFem,
    /// Integration method.
    pub mim: &'a MeshIm,
    /// Global unknown vector.
    pub state: &'a [f64],
    /// Global offset of the brick's mixed variable (0 when it has none).
    pub mixed_offset: usize,
}

impl<'a> BrickContext<'a> {
    /// Displacement part of the state.
    pub fn u(&self) -> &'a [f64] {
        &self.state[..self.mfu.nbdof()]
    }

    /// Mixed variable part of the state.
    pub fn mixed(&self, n: usize) -> &'a [f64] {
        &self.state[self.mixed_offset..self.mixed_offset + n]
    }
}

/// A composable model term.
pub trait Brick: Send + Sync {
    /// Human readable brick name.
    fn name(&self) -> &str;

    /// True when the contribution is affine in the unknowns.
    fn is_linear(&self) -> bool;

    /// True when the tangent contribution is symmetric.
    fn is_symmetric(&self) -> bool {
        true
    }

    /// True when the tangent contribution is positive semi-definite.
    fn is_coercive(&self) -> bool;

    /// Space of the additional unknown introduced by the brick, if any.
    fn mixed_variable(&self) -> Option<&MeshFem> {
        None
    }

    /// Names accepted by [`Brick::param`] and [`Brick::set_param`].
    fn param_list(&self) -> Vec<&'static str>;

    /// Current value of a parameter.
    fn param(&self, name: &str) -> Result<Vec<f64>>;

    /// Change a parameter.
    fn set_param(&mut self, name: &str, values: &[f64]) -> Result<()>;

    /// Tangent and residual contributions at the current state.
    fn assemble(&self, ctx: &BrickContext<'_>) -> Result<Vec<LocalContribution>>;

    /// Unknowns eliminated by the brick with their prescribed values.
    fn constraints(&self, _mfu: &MeshFem) -> Result<Vec<(usize, f64)>> {
        Ok(Vec::new())
    }

    /// Cauchy stress for a displacement gradient, for bricks with a stress law.
    fn cauchy_stress(&self, _grad_u: &Matrix3<f64>) -> Option<Matrix3<f64>> {
        None
    }
}

/// Error for an unknown parameter name.
pub(crate) fn unknown_param(brick: &dyn Brick, name: &str) -> Error {
    Error::Brick(format!(
        "brick '{}' has no parameter '{}' (expected one of {:?})",
        brick.name(),
        name,
        brick.param_list()
    ))
}

/// Check the number of values given to a parameter.
pub(crate) fn expect_len(name: &str, values: &[f64], expected: &[usize]) -> Result<()> {
    if expected.contains(&values.len()) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "parameter '{}' expects {:?} values, got {}",
            name,
            expected,
            values.len()
        )))
    }
}

/// A chain of bricks over a displacement space.
pub struct Model {
    mfu: Arc<MeshFem>,
    mim: Arc<MeshIm>,
    bricks: Vec<Box<dyn Brick>>,
}

impl Model {
    /// Start an empty chain.
    pub fn new(mfu: Arc<MeshFem>, mim: Arc<MeshIm>) -> Result<Self> {
        if !Arc::ptr_eq(mfu.mesh(), mim.mesh()) {
            return Err(Error::Model(
                "displacement fem and integration method live on different meshes".into(),
            ));
        }
        if mfu.qdim() != 3 {
            return Err(Error::Model(format!(
                "the displacement fem must have qdim 3, got {}",
                mfu.qdim()
            )));
        }
        Ok(Self {
            mfu,
            mim,
            bricks: Vec::new(),
        })
    }

    /// Append a brick after the current last one.
    pub fn add_brick(&mut self, brick: Box<dyn Brick>) -> Result<BrickId> {
        if let Some(mf) = brick.mixed_variable() {
            if !Arc::ptr_eq(mf.mesh(), self.mfu.mesh()) {
                return Err(Error::Model(format!(
                    "brick '{}' uses a fem on another mesh",
                    brick.name()
                )));
            }
        }
        debug!(brick = brick.name(), id = self.bricks.len(), "added brick");
        self.bricks.push(brick);
        Ok(self.bricks.len() - 1)
    }

    /// Displacement space.
    pub fn mfu(&self) -> &Arc<MeshFem> {
        &self.mfu
    }

    /// Integration method.
    pub fn mim(&self) -> &Arc<MeshIm> {
        &self.mim
    }

    /// Number of bricks.
    pub fn nb_bricks(&self) -> usize {
        self.bricks.len()
    }

    /// Look up a brick.
    pub fn brick(&self, id: BrickId) -> Result<&dyn Brick> {
        self.bricks
            .get(id)
            .map(|b| b.as_ref())
            .ok_or_else(|| Error::Model(format!("brick {} does not exist", id)))
    }

    /// Look up a brick for modification.
    pub fn brick_mut(&mut self, id: BrickId) -> Result<&mut (dyn Brick + 'static)> {
        self.bricks
            .get_mut(id)
            .map(|b| b.as_mut())
            .ok_or_else(|| Error::Model(format!("brick {} does not exist", id)))
    }

    /// Set a parameter of a brick.
    pub fn set_param(&mut self, id: BrickId, name: &str, values: &[f64]) -> Result<()> {
        self.brick_mut(id)?.set_param(name, values)
    }

    /// Total number of unknowns.
    pub fn nb_dof(&self) -> usize {
        self.mfu.nbdof()
            + self
                .bricks
                .iter()
                .filter_map(|b| b.mixed_variable())
                .map(|mf| mf.nbdof())
                .sum::<usize>()
    }

    /// Range of a brick's mixed variable in the global unknown vector.
    pub fn mixed_range(&self, id: BrickId) -> Result<Range<usize>> {
        let mut offset = self.mfu.nbdof();
        for (i, brick) in self.bricks.iter().enumerate() {
            let n = brick.mixed_variable().map_or(0, |mf| mf.nbdof());
            if i == id {
                if n == 0 {
                    return Err(Error::Model(format!(
                        "brick '{}' has no mixed variable",
                        brick.name()
                    )));
                }
                return Ok(offset..offset + n);
            }
            offset += n;
        }
        Err(Error::Model(format!("brick {} does not exist", id)))
    }

    /// True when every brick is linear.
    pub fn is_linear(&self) -> bool {
        self.bricks.iter().all(|b| b.is_linear())
    }

    /// True when every brick is symmetric.
    pub fn is_symmetric(&self) -> bool {
        self.bricks.iter().all(|b| b.is_symmetric())
    }

    /// True when every brick is coercive.
    pub fn is_coercive(&self) -> bool {
        self.bricks.iter().all(|b| b.is_coercive())
    }

    /// Eliminated unknowns of all bricks; later bricks win on conflicts.
    pub fn constraints(&self) -> Result<HashMap<usize, f64>> {
        let mut constraints = HashMap::new();
        for brick in &self.bricks {
            constraints.extend(brick.constraints(&self.mfu)?);
        }
        Ok(constraints)
    }

    /// Assemble the tangent system at `state`.
    pub fn assemble(&self, state: &[f64]) -> Result<AssembledSystem> {
        let n_dofs = self.nb_dof();
        if state.len() != n_dofs {
            return Err(Error::Model(format!(
                "state has {} entries, the model has {} unknowns",
                state.len(),
                n_dofs
            )));
        }

        let mut contributions = Vec::new();
        let mut offset = self.mfu.nbdof();
        for brick in &self.bricks {
            let ctx = BrickContext {
                mfu: &self.mfu,
                mim: &self.mim,
                state,
                mixed_offset: offset,
            };
            contributions.extend(brick.assemble(&ctx)?);
            offset += brick.mixed_variable().map_or(0, |mf| mf.nbdof());
        }

        AssembledSystem::from_contributions(n_dofs, &contributions, self.constraints()?)
    }
}

/// Global unknowns of a model, filled in by a solve.
#[derive(Debug, Clone)]
pub struct ModelState {
    state: Vec<f64>,
    report: Option<SolveReport>,
}

impl ModelState {
    /// Zero state sized for `model`.
    pub fn new(model: &Model) -> Self {
        Self {
            state: vec![0.0; model.nb_dof()],
            report: None,
        }
    }

    /// The full unknown vector.
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    /// Mutable access to the unknown vector.
    pub fn state_mut(&mut self) -> &mut Vec<f64> {
        &mut self.state
    }

    /// Displacement part, `state[0 .. mfu.nbdof()]`.
    pub fn displacement(&self, model: &Model) -> &[f64] {
        &self.state[..model.mfu().nbdof()]
    }

    /// Mixed variable of a brick.
    pub fn mixed(&self, model: &Model, id: BrickId) -> Result<&[f64]> {
        Ok(&self.state[model.mixed_range(id)?])
    }

    /// Report of the last solve.
    pub fn report(&self) -> Option<&SolveReport> {
        self.report.as_ref()
    }

    pub(crate) fn set_report(&mut self, report: SolveReport) {
        self.report = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bricks::{IsotropicLinearizedElasticity, LinearIncompressibility};
    use crate::fem::FemKind;
    use crate::integration::IntegrationMethod;
    use crate::mesh::Mesh;
    use crate::types::Point3;

    fn spaces() -> (Arc<MeshFem>, Arc<MeshFem>, Arc<MeshIm>) {
        let mesh = Arc::new(
            Mesh::regular_simplices(Point3::zeros(), Point3::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap(),
        );
        let mfu = Arc::new(MeshFem::new(mesh.clone(), FemKind::Pk { degree: 2 }, 3).unwrap());
        let mfp = Arc::new(
            MeshFem::new(mesh.clone(), FemKind::PkDiscontinuous { degree: 0, alpha: 0.0 }, 1)
                .unwrap(),
        );
        let mim = Arc::new(MeshIm::new(mesh, IntegrationMethod::tetrahedron(5).unwrap()));
        (mfu, mfp, mim)
    }

    #[test]
    fn test_mixed_layout() {
        let (mfu, mfp, mim) = spaces();
        let mut model = Model::new(mfu.clone(), mim).unwrap();
        let b0 = model
            .add_brick(Box::new(IsotropicLinearizedElasticity::new(1.0, 1.0)))
            .unwrap();
        let b1 = model
            .add_brick(Box::new(LinearIncompressibility::new(mfp.clone())))
            .unwrap();

        assert_eq!(model.nb_dof(), mfu.nbdof() + 6);
        assert_eq!(model.mixed_range(b1).unwrap(), mfu.nbdof()..mfu.nbdof() + 6);
        assert!(model.mixed_range(b0).is_err());
        assert!(model.is_linear());
        assert!(!model.is_coercive());

        let state = ModelState::new(&model);
        assert_eq!(state.displacement(&model).len(), mfu.nbdof());
        assert_eq!(state.mixed(&model, b1).unwrap().len(), 6);
    }

    #[test]
    fn test_params_through_model() {
        let (mfu, _, mim) = spaces();
        let mut model = Model::new(mfu, mim).unwrap();
        let b0 = model
            .add_brick(Box::new(IsotropicLinearizedElasticity::new(1.0, 1.0)))
            .unwrap();
        model.set_param(b0, "lambda", &[3.0]).unwrap();
        assert_eq!(model.brick(b0).unwrap().param("lambda").unwrap(), vec![3.0]);
        assert!(model.set_param(b0, "nu", &[0.3]).is_err());
        assert!(model.brick(5).is_err());
    }

    #[test]
    fn test_state_size_checked() {
        let (mfu, _, mim) = spaces();
        let model = Model::new(mfu, mim).unwrap();
        assert!(model.assemble(&[0.0; 3]).is_err());
    }

    #[test]
    fn test_rejects_scalar_displacement() {
        let (_, mfp, mim) = spaces();
        assert!(Model::new(mfp, mim).is_err());
    }
}
