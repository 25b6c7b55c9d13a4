//! Stress recovery from a solved model.
//!
//! The stress law of a brick is evaluated at the nodes of a scalar output
//! mesh fem:
//! 1. Loop through all convexes (in parallel)
//! 2. Extract the displacement gradient at each output node of the convex
//! 3. Apply the brick's Cauchy stress law
//! 4. Average over convexes sharing a node (continuous output fems only)

use crate::error::{Error, Result};
use crate::fem::MeshFem;
use crate::model::{BrickId, Model, ModelState};
use crate::types::StressTensor;
use nalgebra::Matrix3;
use rayon::prelude::*;
use std::sync::Arc;

/// Nodal Cauchy stress tensors of a brick, one per basic dof of `mfe`.
pub fn nodal_stresses(
    model: &Model,
    brick_id: BrickId,
    state: &ModelState,
    mfe: &MeshFem,
) -> Result<Vec<StressTensor>> {
    let brick = model.brick(brick_id)?;
    if brick.cauchy_stress(&Matrix3::zeros()).is_none() {
        return Err(Error::Brick(format!(
            "brick '{}' has no stress law",
            brick.name()
        )));
    }
    if mfe.qdim() != 1 {
        return Err(Error::Fem(format!(
            "stress output needs a scalar fem, got qdim {}",
            mfe.qdim()
        )));
    }
    let mfu = model.mfu();
    if !Arc::ptr_eq(mfe.mesh(), mfu.mesh()) {
        return Err(Error::Fem("stress output fem lives on another mesh".into()));
    }

    let u = state.displacement(model);
    let mesh = mfu.mesh();
    let nodes = mfe.local_nodes();

    let per_convex: Vec<Vec<(usize, Matrix3<f64>)>> = (0..mesh.nbcvs())
        .into_par_iter()
        .map(|cv| -> Result<Vec<(usize, Matrix3<f64>)>> {
            let geometry = mesh.convex_geometry(cv)?;
            nodes
                .iter()
                .zip(mfe.basic_dofs(cv))
                .map(|(l, &dof)| {
                    let grad = mfu.grad_at(cv, &geometry, l, u)?;
                    let sigma = brick.cauchy_stress(&grad).unwrap_or_else(Matrix3::zeros);
                    Ok((dof, sigma))
                })
                .collect()
        })
        .collect::<Result<_>>()?;

    let n = mfe.nb_basic_dof();
    let mut sums = vec![Matrix3::zeros(); n];
    let mut counts = vec![0usize; n];
    for (dof, sigma) in per_convex.into_iter().flatten() {
        sums[dof] += sigma;
        counts[dof] += 1;
    }

    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            let sigma = if count > 0 { sum / count as f64 } else { sum };
            StressTensor::from_matrix(&sigma)
        })
        .collect())
}

/// Von Mises stress of a brick on `mfe`.
pub fn von_mises(
    model: &Model,
    brick_id: BrickId,
    state: &ModelState,
    mfe: &MeshFem,
) -> Result<Vec<f64>> {
    Ok(nodal_stresses(model, brick_id, state, mfe)?
        .iter()
        .map(StressTensor::von_mises)
        .collect())
}

/// Tresca stress (largest minus smallest principal stress) of a brick on `mfe`.
pub fn tresca(
    model: &Model,
    brick_id: BrickId,
    state: &ModelState,
    mfe: &MeshFem,
) -> Result<Vec<f64>> {
    Ok(nodal_stresses(model, brick_id, state, mfe)?
        .iter()
        .map(StressTensor::tresca)
        .collect())
}

/// Extremes of a stress field.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StressRange {
    pub min: f64,
    pub max: f64,
}

impl StressRange {
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let first = *values
            .first()
            .ok_or_else(|| Error::InvalidParameter("stress range of an empty field".into()))?;
        Ok(values.iter().fold(
            StressRange {
                min: first,
                max: first,
            },
            |r, &v| StressRange {
                min: r.min.min(v),
                max: r.max.max(v),
            },
        ))
    }
}
