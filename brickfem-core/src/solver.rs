//! Linear system solvers.
//!
//! Provides the direct solvers used by each Newton or linear step, `K Δu = r`.
//!
//! # Solver Backends
//!
//! - [`FaerLuSolver`]: Sparse LU factorization using the faer library. Works
//!   for any non-singular matrix, including the indefinite saddle-point
//!   systems of mixed displacement/pressure models.
//! - [`FaerCholeskySolver`]: Sparse Cholesky factorization using faer, for
//!   symmetric positive definite tangents.
//! - [`DenseLUSolver`]: nalgebra dense LU (for small test problems only).

use crate::error::{Error, Result};
use crate::sparse::CsrMatrix;
use faer::linalg::cholesky::llt::factor::LltError;
use faer::prelude::*;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::linalg::LltError as SparseLltError;
use faer::sparse::{SparseColMat, SymbolicSparseColMat};
use std::fmt;
use std::str::FromStr;

/// Linear solver interface.
pub trait Solver: Send + Sync {
    /// Solve the linear system Ax = b.
    ///
    /// # Arguments
    ///
    /// * `matrix` - System matrix (tangent K)
    /// * `rhs` - Right-hand side vector
    ///
    /// # Returns
    ///
    /// Solution vector
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>>;

    /// Solver name for diagnostics.
    fn name(&self) -> &str;
}

/// Which linear solver a solve should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearSolverKind {
    /// Cholesky for symmetric coercive models, LU otherwise.
    #[default]
    Auto,
    /// Sparse LU (`superlu` is accepted as an alias).
    Lu,
    /// Sparse Cholesky.
    Cholesky,
    /// Dense LU.
    Dense,
}

impl fmt::Display for LinearSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinearSolverKind::Auto => "auto",
            LinearSolverKind::Lu => "lu",
            LinearSolverKind::Cholesky => "cholesky",
            LinearSolverKind::Dense => "dense",
        };
        f.write_str(name)
    }
}

impl FromStr for LinearSolverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(LinearSolverKind::Auto),
            "superlu" | "lu" => Ok(LinearSolverKind::Lu),
            "cholesky" => Ok(LinearSolverKind::Cholesky),
            "dense" => Ok(LinearSolverKind::Dense),
            _ => Err(Error::InvalidParameter(format!(
                "unknown linear solver '{}'",
                s
            ))),
        }
    }
}

/// Dense direct solver using nalgebra LU factorization.
///
/// Converts the matrix to dense storage; meant for small test problems.
#[derive(Debug, Default)]
pub struct DenseLUSolver;

impl DenseLUSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for DenseLUSolver {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        use nalgebra::{DMatrix, DVector};

        if check_system(matrix, rhs)? == 0 {
            return Ok(vec![]);
        }

        let dense = DMatrix::from(matrix);
        let b = DVector::from_column_slice(rhs);

        let lu = dense.lu();
        let solution = lu
            .solve(&b)
            .ok_or_else(|| Error::SingularMatrix("LU factorization failed".into()))?;

        Ok(solution.as_slice().to_vec())
    }

    fn name(&self) -> &str {
        "Dense LU"
    }
}

/// Validate dimensions; returns the system size.
fn check_system(matrix: &CsrMatrix, rhs: &[f64]) -> Result<usize> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(Error::Solver("Matrix must be square".into()));
    }
    if n != rhs.len() {
        return Err(Error::Solver("RHS size mismatch".into()));
    }
    Ok(n)
}

/// Convert nalgebra-sparse CSR matrix to faer SparseColMat (CSC format).
///
/// Each CSR row is scattered into the CSC columns, so the result is the same
/// matrix (not its transpose) and non-symmetric tangents are handled.
fn csr_to_faer_csc(csr: &CsrMatrix) -> SparseColMat<usize, f64> {
    let nrows = csr.nrows();
    let ncols = csr.ncols();

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    // Count entries per column
    let mut col_counts = vec![0usize; ncols];
    for &col in col_indices {
        col_counts[col] += 1;
    }

    let mut col_offsets = vec![0usize; ncols + 1];
    for i in 0..ncols {
        col_offsets[i + 1] = col_offsets[i] + col_counts[i];
    }

    // Rows are visited in increasing order, so row indices end up sorted
    let nnz = values.len();
    let mut csc_row_indices = vec![0usize; nnz];
    let mut csc_values = vec![0.0f64; nnz];
    let mut col_positions = col_offsets[..ncols].to_vec();

    for row in 0..nrows {
        for idx in row_offsets[row]..row_offsets[row + 1] {
            let col = col_indices[idx];
            let pos = col_positions[col];
            csc_row_indices[pos] = row;
            csc_values[pos] = values[idx];
            col_positions[col] += 1;
        }
    }

    // SAFETY: offsets are non-decreasing, row indices are in bounds and sorted
    // within each column, with no duplicates since the CSR input has none
    unsafe {
        SparseColMat::new(
            SymbolicSparseColMat::new_unchecked(nrows, ncols, col_offsets, None, csc_row_indices),
            csc_values,
        )
    }
}

/// Sparse Cholesky solver using the faer library.
///
/// Uses faer's sparse LLᵀ factorization, for the symmetric positive definite
/// tangents of linear elastic models with penalised or eliminated supports.
#[derive(Debug, Default)]
pub struct FaerCholeskySolver;

impl FaerCholeskySolver {
    /// Create a new sparse Cholesky solver.
    pub fn new() -> Self {
        Self
    }
}

impl Solver for FaerCholeskySolver {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        let n = check_system(matrix, rhs)?;
        if n == 0 {
            return Ok(vec![]);
        }

        let csc = csr_to_faer_csc(matrix);
        let csc_ref = csc.as_ref();

        let symbolic = SymbolicLlt::try_new(csc_ref.symbolic(), faer::Side::Lower)
            .map_err(|_| Error::Solver("Symbolic Cholesky analysis failed".into()))?;

        let llt = Llt::try_new_with_symbolic(symbolic, csc_ref, faer::Side::Lower)
            .map_err(|e| match e {
                SparseLltError::Generic(err) => {
                    Error::Solver(format!("Sparse Cholesky error: {:?}", err))
                }
                SparseLltError::Numeric(LltError::NonPositivePivot { index }) => {
                    Error::SingularMatrix(format!(
                        "Matrix is not positive definite at pivot {}",
                        index
                    ))
                }
            })?;

        let mut x = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);
        llt.solve_in_place(x.as_mut());

        Ok((0..n).map(|i| x[(i, 0)]).collect())
    }

    fn name(&self) -> &str {
        "faer Sparse Cholesky (LLᵀ)"
    }
}

/// Sparse LU solver using the faer library.
#[derive(Debug, Default)]
pub struct FaerLuSolver;

impl FaerLuSolver {
    /// Create a new sparse LU solver.
    pub fn new() -> Self {
        Self
    }
}

impl Solver for FaerLuSolver {
    fn solve(&self, matrix: &CsrMatrix, rhs: &[f64]) -> Result<Vec<f64>> {
        let n = check_system(matrix, rhs)?;
        if n == 0 {
            return Ok(vec![]);
        }

        let lu = csr_to_faer_csc(matrix)
            .sp_lu()
            .map_err(|e| Error::SingularMatrix(format!("Sparse LU failed: {:?}", e)))?;

        let mut x = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);
        lu.solve_in_place(x.as_mut());

        let solution: Vec<f64> = (0..n).map(|i| x[(i, 0)]).collect();
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularMatrix(
                "Sparse LU produced non-finite values".into(),
            ));
        }
        Ok(solution)
    }

    fn name(&self) -> &str {
        "faer Sparse LU"
    }
}

/// Pick a solver for a model.
///
/// `Auto` uses Cholesky when the model is symmetric and coercive, LU otherwise.
pub fn select_solver(kind: LinearSolverKind, symmetric_coercive: bool) -> Box<dyn Solver> {
    match kind {
        LinearSolverKind::Auto if symmetric_coercive => Box::new(FaerCholeskySolver::new()),
        LinearSolverKind::Auto | LinearSolverKind::Lu => Box::new(FaerLuSolver::new()),
        LinearSolverKind::Cholesky => Box::new(FaerCholeskySolver::new()),
        LinearSolverKind::Dense => Box::new(DenseLUSolver::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::TripletMatrix;
    use approx::assert_relative_eq;

    fn spd_2x2() -> CsrMatrix {
        // [4 2; 2 3]
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 4.0);
        triplet.add(0, 1, 2.0);
        triplet.add(1, 0, 2.0);
        triplet.add(1, 1, 3.0);
        triplet.to_csr().unwrap()
    }

    #[test]
    fn test_dense_lu_simple() {
        // Simple 2x2 system: [2 1; 1 3] * [x; y] = [1; 2]
        // Solution: x = 1/5, y = 3/5
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 2.0);
        triplet.add(0, 1, 1.0);
        triplet.add(1, 0, 1.0);
        triplet.add(1, 1, 3.0);

        let matrix = triplet.to_csr().unwrap();
        let solution = DenseLUSolver::new().solve(&matrix, &[1.0, 2.0]).unwrap();

        assert_relative_eq!(solution[0], 0.2, epsilon = 1e-10);
        assert_relative_eq!(solution[1], 0.6, epsilon = 1e-10);
    }

    #[test]
    fn test_empty_system() {
        let matrix = TripletMatrix::new(0, 0).to_csr().unwrap();
        for solver in [
            select_solver(LinearSolverKind::Dense, true),
            select_solver(LinearSolverKind::Cholesky, true),
            select_solver(LinearSolverKind::Lu, true),
        ] {
            assert!(solver.solve(&matrix, &[]).unwrap().is_empty());
        }
    }

    #[test]
    fn test_faer_cholesky_simple_spd() {
        // [4 2; 2 3] * [x; y] = [4; 5] → x = 0.25, y = 1.5
        let solution = FaerCholeskySolver::new().solve(&spd_2x2(), &[4.0, 5.0]).unwrap();

        assert_relative_eq!(solution[0], 0.25, epsilon = 1e-10);
        assert_relative_eq!(solution[1], 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_faer_cholesky_3x3_spd() {
        // A = [4 2 0; 2 5 2; 0 2 3], b = [2; 8; 5]
        // Solution: x = [-3/16, 11/8, 3/4]
        let mut triplet = TripletMatrix::new(3, 3);
        triplet.add(0, 0, 4.0);
        triplet.add(0, 1, 2.0);
        triplet.add(1, 0, 2.0);
        triplet.add(1, 1, 5.0);
        triplet.add(1, 2, 2.0);
        triplet.add(2, 1, 2.0);
        triplet.add(2, 2, 3.0);

        let matrix = triplet.to_csr().unwrap();
        let solution = FaerCholeskySolver::new().solve(&matrix, &[2.0, 8.0, 5.0]).unwrap();

        let expected = [-0.1875, 1.375, 0.75];
        for i in 0..3 {
            assert_relative_eq!(solution[i], expected[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_faer_cholesky_rhs_mismatch() {
        let solver = FaerCholeskySolver::new();
        assert!(solver.solve(&spd_2x2(), &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_faer_cholesky_not_positive_definite() {
        // Eigenvalues 3 and -1
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 1.0);
        triplet.add(0, 1, 2.0);
        triplet.add(1, 0, 2.0);
        triplet.add(1, 1, 1.0);

        let matrix = triplet.to_csr().unwrap();
        assert!(FaerCholeskySolver::new().solve(&matrix, &[1.0, 1.0]).is_err());

        // LU handles the indefinite case: [1 2; 2 1] x = [3; 3] → x = [1, 1]
        let x = FaerLuSolver::new().solve(&matrix, &[3.0, 3.0]).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_faer_lu_non_symmetric() {
        // [2 1 0; 0 3 1; 1 0 4] x = [3; 4; 5] → x = [1, 1, 1]
        let mut triplet = TripletMatrix::new(3, 3);
        triplet.add(0, 0, 2.0);
        triplet.add(0, 1, 1.0);
        triplet.add(1, 1, 3.0);
        triplet.add(1, 2, 1.0);
        triplet.add(2, 0, 1.0);
        triplet.add(2, 2, 4.0);

        let matrix = triplet.to_csr().unwrap();
        let x = FaerLuSolver::new().solve(&matrix, &[3.0, 4.0, 5.0]).unwrap();
        for v in x {
            assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_saddle_point_system() {
        // [K Bᵀ; B 0] with K = 2I, B = [1 1]
        let mut triplet = TripletMatrix::new(3, 3);
        triplet.add(0, 0, 2.0);
        triplet.add(1, 1, 2.0);
        triplet.add(0, 2, 1.0);
        triplet.add(1, 2, 1.0);
        triplet.add(2, 0, 1.0);
        triplet.add(2, 1, 1.0);

        let matrix = triplet.to_csr().unwrap();
        let solver = select_solver(LinearSolverKind::Auto, false);
        assert_eq!(solver.name(), "faer Sparse LU");
        // u = [1, -1], p = 0 satisfies 2u + p = [2, -2] and u0 + u1 = 0
        let x = solver.solve(&matrix, &[2.0, -2.0, 0.0]).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_select_solver() {
        assert_eq!(
            select_solver(LinearSolverKind::Auto, true).name(),
            "faer Sparse Cholesky (LLᵀ)"
        );
        assert_eq!(select_solver(LinearSolverKind::Dense, false).name(), "Dense LU");
    }

    #[test]
    fn test_parse_solver_names() {
        assert_eq!("superlu".parse::<LinearSolverKind>().unwrap(), LinearSolverKind::Lu);
        assert_eq!("Cholesky".parse::<LinearSolverKind>().unwrap(), LinearSolverKind::Cholesky);
        assert!("mumps".parse::<LinearSolverKind>().is_err());
    }

    #[test]
    fn test_fea_like_stiffness_matrix() {
        // Banded SPD matrix, as in 1D assembly
        let mut triplet = TripletMatrix::new(6, 6);
        for i in 0..6 {
            triplet.add(i, i, 4.0);
        }
        for i in 0..5 {
            triplet.add(i, i + 1, -1.0);
            triplet.add(i + 1, i, -1.0);
        }

        let matrix = triplet.to_csr().unwrap();
        let rhs = vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0];

        let solution = FaerCholeskySolver::new().solve(&matrix, &rhs).unwrap();
        assert!(solution.iter().all(|&x| x.is_finite()));

        // ||Ax - b||
        let dense = nalgebra::DMatrix::from(&matrix);
        let x_vec = nalgebra::DVector::from_vec(solution);
        let b_vec = nalgebra::DVector::from_vec(rhs);
        let residual = (&dense * &x_vec - &b_vec).norm();
        assert!(residual < 1e-10, "Residual too large: {}", residual);
    }
}
