//! Parallel finite element assembly.
//!
//! Bricks compute their convex (or face) contributions in parallel with
//! Rayon; the contributions are then scattered sequentially into the global
//! triplet matrix and residual vector.

use crate::error::Result;
use crate::mesh::Face;
use crate::sparse::{csr_mul, scatter, CsrMatrix, LocalContribution, SparseVector, TripletMatrix};
use rayon::prelude::*;
use std::collections::HashMap;

/// Assembled tangent system of a model at a given state.
#[derive(Debug, Clone)]
pub struct AssembledSystem {
    /// Global tangent matrix ∂R/∂U.
    pub tangent: CsrMatrix,
    /// Residual R(U) = internal − external forces.
    pub residual: Vec<f64>,
    /// Number of unknowns.
    pub n_dofs: usize,
    /// Eliminated unknowns and their prescribed values.
    pub constraints: HashMap<usize, f64>,
}

impl AssembledSystem {
    /// Build the system from all brick contributions.
    pub fn from_contributions(
        n_dofs: usize,
        contributions: &[LocalContribution],
        constraints: HashMap<usize, f64>,
    ) -> Result<Self> {
        // ~81 non-zeros per row for quadratic tetrahedra
        let mut triplet = TripletMatrix::with_capacity(n_dofs, n_dofs, n_dofs * 81);
        let mut residual = SparseVector::zeros(n_dofs);
        scatter(contributions, &mut triplet, &mut residual);
        Ok(Self {
            tangent: triplet.to_csr()?,
            residual: residual.into_vec(),
            n_dofs,
            constraints,
        })
    }

    /// Euclidean norm of the residual restricted to the free unknowns.
    pub fn residual_norm(&self) -> f64 {
        self.residual
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.constraints.contains_key(i))
            .map(|(_, r)| r * r)
            .sum::<f64>()
            .sqrt()
    }

    /// Unknowns that are not eliminated, in increasing order.
    pub fn free_dofs(&self) -> Vec<usize> {
        (0..self.n_dofs)
            .filter(|dof| !self.constraints.contains_key(dof))
            .collect()
    }

    /// Tangent and right-hand side `−R` restricted to the free unknowns.
    ///
    /// The state must already carry the prescribed values, so eliminated
    /// unknowns have a zero increment.
    pub fn reduced(&self) -> Result<(Vec<usize>, CsrMatrix, Vec<f64>)> {
        let free_dofs = self.free_dofs();
        let mut dof_to_reduced: HashMap<usize, usize> = HashMap::new();
        for (reduced_idx, &dof) in free_dofs.iter().enumerate() {
            dof_to_reduced.insert(dof, reduced_idx);
        }

        let n_free = free_dofs.len();
        let mut reduced_triplet = TripletMatrix::with_capacity(n_free, n_free, self.tangent.nnz());
        let mut reduced_rhs = vec![0.0; n_free];

        for (row, lane) in self.tangent.row_iter().enumerate() {
            let Some(&reduced_row) = dof_to_reduced.get(&row) else {
                continue;
            };
            for (&col, &value) in lane.col_indices().iter().zip(lane.values()) {
                if let Some(&reduced_col) = dof_to_reduced.get(&col) {
                    reduced_triplet.add(reduced_row, reduced_col, value);
                }
            }
            reduced_rhs[reduced_row] = -self.residual[row];
        }

        Ok((free_dofs, reduced_triplet.to_csr()?, reduced_rhs))
    }

    /// `K x`, used to check increments in tests and diagnostics.
    pub fn apply_tangent(&self, x: &[f64]) -> Vec<f64> {
        csr_mul(&self.tangent, x)
    }
}

/// Evaluate `f` on every convex in parallel.
pub fn assemble_convexes<F>(convexes: &[usize], f: F) -> Result<Vec<LocalContribution>>
where
    F: Fn(usize) -> Result<LocalContribution> + Sync + Send,
{
    convexes.par_iter().map(|&cv| f(cv)).collect()
}

/// Evaluate `f` on every face in parallel.
pub fn assemble_faces<F>(faces: &[Face], f: F) -> Result<Vec<LocalContribution>>
where
    F: Fn(Face) -> Result<LocalContribution> + Sync + Send,
{
    faces.par_iter().map(|&face| f(face)).collect()
}
