//! Pairwise subject similarity.
//!
//! A [`Similarity`] turns two subject × target matrices into a dense
//! `a.nrows() × b.nrows()` matrix. The model always passes the same centered
//! matrix twice. Built-in strategies walk the sparse layout directly: for each
//! row of `a` they scatter products through the transpose of `b`, so only
//! co-rated targets are ever touched, and rows are computed in parallel.
//!
//! Any dense function can be plugged in through [`FnSimilarity`].
use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::config::SimilarityKind;
use crate::error::{CfError, Result};
use crate::math::CsrMatrix;

pub trait Similarity: Send + Sync {
    fn name(&self) -> &str;

    /// Similarity between every row of `a` and every row of `b`.
    ///
    /// Both matrices must have the same number of columns. Degenerate
    /// (all-zero) rows should score 0. Non-finite output is replaced by 0 when
    /// the model is fitted.
    fn compute(&self, a: &CsrMatrix, b: &CsrMatrix) -> Result<Array2<f64>>;
}

/// Instantiate a built-in strategy.
pub fn from_kind(kind: SimilarityKind) -> Box<dyn Similarity> {
    match kind {
        SimilarityKind::Cosine => Box::new(Cosine),
        SimilarityKind::Pearson => Box::new(Pearson),
        SimilarityKind::Jaccard => Box::new(Jaccard),
    }
}

/// Cosine of the angle between two rows. Zero-norm rows score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Similarity for Cosine {
    fn name(&self) -> &str {
        "cosine"
    }

    fn compute(&self, a: &CsrMatrix, b: &CsrMatrix) -> Result<Array2<f64>> {
        check_columns(a, b)?;
        // Cosine ignores row scale. With entries in [-1, 1] and each non-zero
        // row holding a ±1, squared norms lie in [1, ncols] and cannot
        // overflow or underflow.
        let a = a.scaled_by_row_max();
        let b = b.scaled_by_row_max();
        let a_sq = squared_norms(&a);
        let b_sq = squared_norms(&b);

        Ok(pairwise(&a, &b, |i, j, dot, _| {
            // sqrt(x * x) == x exactly, so a non-zero row scores exactly 1.0
            // against itself.
            let denom = (a_sq[i] * b_sq[j]).sqrt();
            if denom == 0.0 {
                0.0
            } else {
                (dot / denom).clamp(-1.0, 1.0)
            }
        }))
    }
}

/// Pearson correlation of the rows read as dense vectors (absent entries are 0).
/// Rows with zero variance score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pearson;

impl Similarity for Pearson {
    fn name(&self) -> &str {
        "pearson"
    }

    fn compute(&self, a: &CsrMatrix, b: &CsrMatrix) -> Result<Array2<f64>> {
        check_columns(a, b)?;
        let n = a.ncols() as f64;
        if a.ncols() == 0 {
            return Ok(Array2::zeros((a.nrows(), b.nrows())));
        }
        // Correlation is invariant to positive row scaling.
        let a = &a.scaled_by_row_max();
        let b = &b.scaled_by_row_max();

        let a_mean: Vec<f64> = (0..a.nrows()).map(|i| a.row(i).sum() / n).collect();
        let b_mean: Vec<f64> = (0..b.nrows()).map(|j| b.row(j).sum() / n).collect();
        let a_var: Vec<f64> = (0..a.nrows())
            .map(|i| a.row(i).squared_norm() - n * (a_mean[i] * a_mean[i]))
            .collect();
        let b_var: Vec<f64> = (0..b.nrows())
            .map(|j| b.row(j).squared_norm() - n * (b_mean[j] * b_mean[j]))
            .collect();

        Ok(pairwise(a, b, |i, j, dot, _| {
            if a_var[i] <= 0.0 || b_var[j] <= 0.0 {
                return 0.0;
            }
            let cov = dot - n * (a_mean[i] * b_mean[j]);
            (cov / (a_var[i].sqrt() * b_var[j].sqrt())).clamp(-1.0, 1.0)
        }))
    }
}

/// Jaccard index of the sets of rated targets. Values are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl Similarity for Jaccard {
    fn name(&self) -> &str {
        "jaccard"
    }

    fn compute(&self, a: &CsrMatrix, b: &CsrMatrix) -> Result<Array2<f64>> {
        check_columns(a, b)?;
        let a_len: Vec<usize> = (0..a.nrows()).map(|i| a.row(i).len()).collect();
        let b_len: Vec<usize> = (0..b.nrows()).map(|j| b.row(j).len()).collect();

        Ok(pairwise(a, b, |i, j, _, shared| {
            let union = a_len[i] + b_len[j] - shared;
            if union == 0 {
                0.0
            } else {
                shared as f64 / union as f64
            }
        }))
    }
}

/// Adapter for any `(dense A, dense B) -> dense` similarity function.
///
/// The sparse inputs are densified before the call, which costs
/// `rows × columns` memory per operand.
pub struct FnSimilarity<F> {
    name: String,
    func: F,
}

impl<F> FnSimilarity<F>
where
    F: Fn(&Array2<f64>, &Array2<f64>) -> Array2<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Similarity for FnSimilarity<F>
where
    F: Fn(&Array2<f64>, &Array2<f64>) -> Array2<f64> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, a: &CsrMatrix, b: &CsrMatrix) -> Result<Array2<f64>> {
        check_columns(a, b)?;
        let out = (self.func)(&a.to_dense(), &b.to_dense());

        let expected = (a.nrows(), b.nrows());
        if out.dim() != expected {
            return Err(CfError::DimensionMismatch {
                expected,
                actual: out.dim(),
            });
        }

        Ok(out)
    }
}

/// Replace NaN and infinite entries by 0 and return how many were replaced.
pub fn replace_non_finite(sim: &mut Array2<f64>) -> usize {
    let mut replaced = 0usize;
    sim.mapv_inplace(|v| {
        if v.is_finite() {
            v
        } else {
            replaced += 1;
            0.0
        }
    });
    replaced
}

/// Dense cosine similarity between the rows of `a` and the rows of `b`.
///
/// Rows with zero norm score 0 against everything, including themselves.
pub fn cosine_similarity(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let a_sq: Vec<f64> = a.axis_iter(Axis(0)).map(|r| r.dot(&r)).collect();
    let b_sq: Vec<f64> = b.axis_iter(Axis(0)).map(|r| r.dot(&r)).collect();
    let mut dots = a.dot(&b.t());

    for ((i, j), v) in dots.indexed_iter_mut() {
        let denom = (a_sq[i] * b_sq[j]).sqrt();
        *v = if denom == 0.0 {
            0.0
        } else {
            (*v / denom).clamp(-1.0, 1.0)
        };
    }
    dots
}

fn check_columns(a: &CsrMatrix, b: &CsrMatrix) -> Result<()> {
    if a.ncols() != b.ncols() {
        return Err(CfError::DimensionMismatch {
            expected: a.shape(),
            actual: b.shape(),
        });
    }
    Ok(())
}

fn squared_norms(m: &CsrMatrix) -> Vec<f64> {
    (0..m.nrows()).map(|i| m.row(i).squared_norm()).collect()
}

/// Scatter-accumulate dot products and co-occurrence counts for every row pair,
/// then map them through `score(i, j, dot, shared)`.
///
/// For a fixed pair the products are summed in ascending column order from
/// either side, so `pairwise(m, m, ..)` is exactly symmetric when `score` is.
fn pairwise<F>(a: &CsrMatrix, b: &CsrMatrix, score: F) -> Array2<f64>
where
    F: Fn(usize, usize, f64, usize) -> f64 + Sync,
{
    let bt = b.transpose();
    let (n, m) = (a.nrows(), b.nrows());

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut dots = vec![0.0f64; m];
            let mut shared = vec![0usize; m];
            for (t, v) in a.row(i).iter() {
                for (j, w) in bt.row(t).iter() {
                    dots[j] += v * w;
                    shared[j] += 1;
                }
            }
            (0..m).map(|j| score(i, j, dots[j], shared[j])).collect()
        })
        .collect();

    Array2::from_shape_fn((n, m), |(i, j)| rows[i][j])
}
