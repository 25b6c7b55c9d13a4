//! Model solve: one direct solve for linear models, Newton otherwise.
//!
//! Eliminated constraints are written into the state first; every step then
//! solves the tangent system restricted to the free unknowns.

use crate::error::{Error, Result};
use crate::model::{Model, ModelState};
use crate::solver::{select_solver, LinearSolverKind, Solver};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Halvings tried by the line search before a step is taken as is.
const MAX_HALVINGS: usize = 6;

macro_rules! progress {
    ($noisy:expr, $($arg:tt)*) => {
        if $noisy {
            info!($($arg)*)
        } else {
            debug!($($arg)*)
        }
    };
}

/// Options of [`standard_solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Log every iteration at `info` level.
    pub noisy: bool,
    /// Newton iteration limit.
    pub max_iter: usize,
    /// Target residual, relative to the initial residual.
    pub max_res: f64,
    /// Linear solver of each step.
    pub lsolver: LinearSolverKind,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            noisy: false,
            max_iter: 100,
            max_res: 1e-6,
            lsolver: LinearSolverKind::Auto,
        }
    }
}

impl SolveOptions {
    /// Parse a flat option list such as `["noisy", "lsolver", "superlu"]`.
    pub fn from_args(args: &[&str]) -> Result<Self> {
        let mut options = Self::default();
        let mut it = args.iter();
        while let Some(&arg) = it.next() {
            let mut value = || {
                it.next()
                    .copied()
                    .ok_or_else(|| Error::InvalidParameter(format!("option '{}' needs a value", arg)))
            };
            match arg {
                "noisy" | "very noisy" => options.noisy = true,
                "max_iter" => {
                    let v = value()?;
                    options.max_iter = v.parse().map_err(|_| {
                        Error::InvalidParameter(format!("max_iter expects an integer, got '{}'", v))
                    })?;
                }
                "max_res" => {
                    let v = value()?;
                    options.max_res = v.parse().map_err(|_| {
                        Error::InvalidParameter(format!("max_res expects a number, got '{}'", v))
                    })?;
                }
                "lsolver" => options.lsolver = value()?.parse()?,
                _ => {
                    return Err(Error::InvalidParameter(format!(
                        "unknown solve option '{}'",
                        arg
                    )))
                }
            }
        }
        Ok(options)
    }
}

/// Outcome of a solve.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    /// Linear solves performed.
    pub iterations: usize,
    /// Final residual norm on the free unknowns.
    pub residual: f64,
    /// Residual norm before the first step.
    pub initial_residual: f64,
    pub solver: String,
    pub time_seconds: f64,
    /// Residual tolerance reached. False when Newton stopped on a stagnating
    /// increment.
    pub converged: bool,
}

/// Solve `model` starting from the current `state`.
///
/// The report is returned and also stored in the state.
pub fn standard_solve(
    model: &Model,
    state: &mut ModelState,
    options: &SolveOptions,
) -> Result<SolveReport> {
    let start = Instant::now();
    let n = model.nb_dof();
    if state.state().len() != n {
        return Err(Error::Model(format!(
            "state has {} entries, the model has {} unknowns",
            state.state().len(),
            n
        )));
    }

    let constraints = model.constraints()?;
    for (&dof, &value) in &constraints {
        state.state_mut()[dof] = value;
    }

    let solver = select_solver(options.lsolver, model.is_symmetric() && model.is_coercive());
    progress!(
        options.noisy,
        unknowns = n,
        eliminated = constraints.len(),
        solver = solver.name(),
        linear = model.is_linear(),
        "starting solve"
    );

    let (iterations, residual, initial_residual, converged) = if model.is_linear() {
        linear_solve(model, state, solver.as_ref(), options)?
    } else {
        newton_solve(model, state, solver.as_ref(), options)?
    };

    let report = SolveReport {
        iterations,
        residual,
        initial_residual,
        solver: solver.name().to_string(),
        time_seconds: start.elapsed().as_secs_f64(),
        converged,
    };
    progress!(
        options.noisy,
        iterations,
        residual,
        converged,
        seconds = report.time_seconds,
        "solve finished"
    );
    state.set_report(report.clone());
    Ok(report)
}

/// Add a reduced increment back onto the free unknowns.
fn add_increment(state: &mut [f64], free: &[usize], du: &[f64], step: f64) {
    for (&dof, &d) in free.iter().zip(du) {
        state[dof] += step * d;
    }
}

fn linear_solve(
    model: &Model,
    state: &mut ModelState,
    solver: &dyn Solver,
    options: &SolveOptions,
) -> Result<(usize, f64, f64, bool)> {
    let system = model.assemble(state.state())?;
    let r0 = system.residual_norm();
    let (free, k, rhs) = system.reduced()?;
    progress!(options.noisy, residual = r0, nnz = k.nnz(), "linear system assembled");
    let du = solver.solve(&k, &rhs)?;

    let mut full = vec![0.0; system.n_dofs];
    add_increment(&mut full, &free, &du, 1.0);
    add_increment(state.state_mut(), &free, &du, 1.0);

    // R(U + ΔU) = R(U) + K ΔU for an affine model
    let kdu = system.apply_tangent(&full);
    let (mut residual, mut kdu_norm) = (0.0f64, 0.0f64);
    for &dof in &free {
        residual += (system.residual[dof] + kdu[dof]).powi(2);
        kdu_norm += kdu[dof].powi(2);
    }
    let residual = residual.sqrt();
    // relative to the larger of the two cancelling terms
    let scale = r0.max(kdu_norm.sqrt());
    let converged = residual.is_finite() && residual <= options.max_res * scale;
    if !converged {
        warn!(residual, scale, "linear solve leaves a large residual");
    }
    Ok((1, residual, r0, converged))
}

fn newton_solve(
    model: &Model,
    state: &mut ModelState,
    solver: &dyn Solver,
    options: &SolveOptions,
) -> Result<(usize, f64, f64, bool)> {
    let mut system = model.assemble(state.state())?;
    let r0 = system.residual_norm();
    let target = options.max_res * r0;
    let mut residual = r0;
    let mut iterations = 0;
    progress!(options.noisy, iter = 0, residual, "newton");

    while residual > target {
        if iterations >= options.max_iter {
            return Err(Error::NotConverged {
                iterations,
                residual,
            });
        }
        iterations += 1;

        let (free, k, rhs) = system.reduced()?;
        let du = solver.solve(&k, &rhs)?;

        let mut step = 1.0;
        let mut halvings = 0;
        let (trial_state, trial_system, trial_residual) = loop {
            let mut trial = state.state().to_vec();
            add_increment(&mut trial, &free, &du, step);
            let trial_system = model.assemble(&trial)?;
            let trial_residual = trial_system.residual_norm();
            if trial_residual < residual || halvings == MAX_HALVINGS {
                break (trial, trial_system, trial_residual);
            }
            step *= 0.5;
            halvings += 1;
        };

        let increment = step * du.iter().map(|d| d * d).sum::<f64>().sqrt();
        let size = trial_state.iter().map(|x| x * x).sum::<f64>().sqrt();
        *state.state_mut() = trial_state;
        system = trial_system;
        residual = trial_residual;
        progress!(options.noisy, iter = iterations, residual, step, "newton");

        if residual > target && increment <= 1e-14 * size.max(1.0) {
            warn!(
                iterations,
                residual, "newton increment stagnates, stopping"
            );
            break;
        }
    }

    Ok((iterations, residual, r0, residual <= target))
}
