//! Sparse storage for the centered rating matrix.
//!
//! `CsrMatrix` is a compressed-sparse-row matrix with sorted column indices per
//! row; `SparseRow` is a borrowed view of one row. Dense results (the similarity
//! matrix) use `ndarray::Array2`.
pub mod sparse;
pub mod vector;

pub use sparse::{CsrMatrix, ShapeError};
pub use vector::SparseRow;
