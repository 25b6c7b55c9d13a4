//! Sparse matrix operations.
//!
//! Uses CSR (Compressed Sparse Row) format for the assembled tangent matrix
//! and compatibility with the direct solvers.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix as NalgebraCsr;

/// Compressed Sparse Row matrix.
pub type CsrMatrix = NalgebraCsr<f64>;

/// Element-level contribution produced by a brick on one convex or face.
///
/// `matrix` couples `rows` (test functions) with `cols` (unknowns); `vector`
/// is the residual part on `rows`. Either may be empty.
#[derive(Debug, Clone)]
pub struct LocalContribution {
    /// Global row indices.
    pub rows: Vec<usize>,
    /// Global column indices.
    pub cols: Vec<usize>,
    /// Tangent block, `rows.len() × cols.len()` (or empty).
    pub matrix: DMatrix<f64>,
    /// Residual block, `rows.len()` (or empty).
    pub vector: DVector<f64>,
}

impl LocalContribution {
    /// Square block on `dofs` with its residual.
    pub fn square(dofs: Vec<usize>, matrix: DMatrix<f64>, vector: DVector<f64>) -> Self {
        Self {
            cols: dofs.clone(),
            rows: dofs,
            matrix,
            vector,
        }
    }
}

/// Builder for assembling a sparse matrix from triplets (COO format).
///
/// Accumulates (row, col, value) triplets and converts to CSR when complete.
#[derive(Debug, Clone)]
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Create a new triplet matrix builder.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self::with_capacity(n_rows, n_cols, 0)
    }

    /// Create with estimated capacity.
    pub fn with_capacity(n_rows: usize, n_cols: usize, nnz_estimate: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::with_capacity(nnz_estimate),
            cols: Vec::with_capacity(nnz_estimate),
            values: Vec::with_capacity(nnz_estimate),
        }
    }

    /// Add a value at (row, col). Duplicates are summed during conversion.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.n_rows, "Row index out of bounds");
        debug_assert!(col < self.n_cols, "Column index out of bounds");

        if value != 0.0 {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
    }

    /// Add a dense block coupling `rows` with `cols`.
    ///
    /// This is the core operation for finite element assembly.
    pub fn add_block(&mut self, rows: &[usize], cols: &[usize], block: &DMatrix<f64>) {
        debug_assert_eq!(block.nrows(), rows.len());
        debug_assert_eq!(block.ncols(), cols.len());

        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                self.add(r, c, block[(i, j)]);
            }
        }
    }

    /// Number of stored triplets.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Convert to CSR format, summing duplicate entries.
    pub fn to_csr(self) -> Result<CsrMatrix> {
        let coo = CooMatrix::try_from_triplets(
            self.n_rows,
            self.n_cols,
            self.rows,
            self.cols,
            self.values,
        )
        .map_err(|e| Error::Solver(format!("invalid triplet data: {}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }
}

/// Dense vector assembled from scattered contributions.
#[derive(Debug, Clone)]
pub struct SparseVector {
    values: Vec<f64>,
}

impl SparseVector {
    /// Create a zero vector of given size.
    pub fn zeros(size: usize) -> Self {
        Self {
            values: vec![0.0; size],
        }
    }

    /// Add values at multiple indices (for element residual assembly).
    pub fn add_subvector(&mut self, indices: &[usize], values: &[f64]) {
        debug_assert_eq!(indices.len(), values.len());
        for (&idx, &val) in indices.iter().zip(values.iter()) {
            self.values[idx] += val;
        }
    }

    /// Get the underlying dense vector.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Consume and return the dense vector.
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

/// Scatter local contributions into a global matrix and vector.
pub fn scatter(
    contributions: &[LocalContribution],
    matrix: &mut TripletMatrix,
    vector: &mut SparseVector,
) {
    for c in contributions {
        if c.matrix.nrows() > 0 {
            matrix.add_block(&c.rows, &c.cols, &c.matrix);
        }
        if c.vector.len() > 0 {
            vector.add_subvector(&c.rows, c.vector.as_slice());
        }
    }
}

/// `y = A x` for a CSR matrix.
pub fn csr_mul(a: &CsrMatrix, x: &[f64]) -> Vec<f64> {
    a.row_iter()
        .map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&j, &v)| v * x[j])
                .sum()
        })
        .collect()
}
