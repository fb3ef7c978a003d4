//! Subject mean centering and assembly of the centered sparse matrix.
//!
//! Means are computed once from the raw values; centering then subtracts them.
//! The centered matrix is laid out with targets as rows and subjects as columns
//! so that "everyone who rated target t" is a single row slice.
use crate::index::IdIndex;
use crate::math::{CsrMatrix, ShapeError};
use crate::ratings::RatingSet;

/// Output of the normalization phase, in compact positions.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub subject_means: Vec<f64>,
    /// Centered value for each input rating, aligned with the rating sequence.
    pub centered: Vec<f64>,
}

/// Mean rating per subject position in `subjects`.
///
/// Subjects of the index with no ratings get 0.0 rather than 0/0.
pub fn subject_means(ratings: &RatingSet, subjects: &IdIndex) -> Vec<f64> {
    let mut sums = vec![0.0f64; subjects.len()];
    let mut counts = vec![0usize; subjects.len()];

    for rating in ratings {
        if let Some(pos) = subjects.position(rating.subject) {
            sums[pos] += rating.value;
            counts[pos] += 1;
        }
    }

    sums.iter()
        .zip(counts.iter())
        .map(|(&sum, &count)| if count == 0 { 0.0 } else { sum / count as f64 })
        .collect()
}

/// Compute subject means and center every rating around its subject's mean.
pub fn normalize(ratings: &RatingSet, subjects: &IdIndex) -> Normalized {
    let subject_means = subject_means(ratings, subjects);
    let centered = ratings
        .iter()
        .map(|rating| {
            let mean = subjects
                .position(rating.subject)
                .map(|pos| subject_means[pos])
                .unwrap_or(0.0);
            rating.value - mean
        })
        .collect();

    Normalized {
        subject_means,
        centered,
    }
}

/// Build the `(target, subject)` matrix of centered values.
///
/// `centered` must be aligned with `ratings`. Both indices must contain every
/// id that occurs in `ratings`.
pub fn build_centered_matrix(
    ratings: &RatingSet,
    centered: &[f64],
    subjects: &IdIndex,
    targets: &IdIndex,
) -> Result<CsrMatrix, ShapeError> {
    let triplets = ratings
        .iter()
        .zip(centered.iter())
        .map(|(rating, &value)| {
            let t = targets.position(rating.target).unwrap_or(usize::MAX);
            let s = subjects.position(rating.subject).unwrap_or(usize::MAX);
            (t, s, value)
        })
        .collect::<Vec<_>>();

    CsrMatrix::from_triplets((targets.len(), subjects.len()), &triplets)
}
