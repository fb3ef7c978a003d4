//! The neighborhood model: fit once, then query.
//!
//! `fit` runs normalization, builds the centered `(target, subject)` matrix and
//! computes the dense subject similarity matrix. It takes `&mut self` while every
//! query takes `&self`, so a fit can never overlap with queries, and a fitted
//! model can be shared across threads for read-only use.
use std::cmp::Ordering;
use std::fmt;
use std::time::Instant;

use ndarray::Array2;
use rayon::prelude::*;

use crate::config::ModelConfig;
use crate::error::{CfError, Result};
use crate::index::IdIndex;
use crate::math::CsrMatrix;
use crate::normalize::{build_centered_matrix, normalize};
use crate::ratings::RatingSet;
use crate::similarity::{self, replace_non_finite, Similarity};

/// Added to the denominator of the weighted neighbor average. It is the only
/// guard against a zero similarity mass and biases predictions slightly toward
/// the subject mean.
pub const EPSILON: f64 = 1e-8;

/// One neighbor that contributed to a prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub subject: u32,
    pub similarity: f64,
    /// The neighbor's centered rating of the queried target.
    pub centered: f64,
}

pub struct NeighborhoodModel {
    ratings: RatingSet,
    config: ModelConfig,
    similarity: Box<dyn Similarity>,
    fitted: Option<Fitted>,
}

/// Everything derived by `fit`, in compact positions.
struct Fitted {
    subjects: IdIndex,
    targets: IdIndex,
    subject_means: Vec<f64>,
    /// targets × subjects
    centered: CsrMatrix,
    /// subjects × targets
    by_subject: CsrMatrix,
    similarity: Array2<f64>,
}

impl NeighborhoodModel {
    /// Create an unfitted model using the similarity named in `config`.
    pub fn new(ratings: RatingSet, config: ModelConfig) -> Result<Self> {
        let similarity = similarity::from_kind(config.similarity);
        Self::with_similarity(ratings, config, similarity)
    }

    /// Create an unfitted model with a custom similarity strategy. The
    /// `similarity` field of `config` is ignored.
    pub fn with_similarity(
        ratings: RatingSet,
        config: ModelConfig,
        similarity: Box<dyn Similarity>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ratings,
            config,
            similarity,
            fitted: None,
        })
    }

    /// Run all three phases, replacing any previous fit.
    pub fn fit(&mut self) -> Result<()> {
        let start = Instant::now();
        self.fitted = None;

        let subjects = IdIndex::from_ids(self.ratings.iter().map(|r| r.subject));
        let targets = IdIndex::from_ids(self.ratings.iter().map(|r| r.target));

        let normalized = normalize(&self.ratings, &subjects);
        let centered =
            build_centered_matrix(&self.ratings, &normalized.centered, &subjects, &targets)
                .map_err(|e| CfError::InvalidConfig(e.to_string()))?;
        let by_subject = centered.transpose();
        log::debug!(
            "Normalized {} ratings over {} subjects and {} targets in {:.2?}",
            self.ratings.len(),
            subjects.len(),
            targets.len(),
            start.elapsed()
        );

        let sim_start = Instant::now();
        let mut similarity = self.similarity.compute(&by_subject, &by_subject)?;
        let expected = (subjects.len(), subjects.len());
        if similarity.dim() != expected {
            return Err(CfError::DimensionMismatch {
                expected,
                actual: similarity.dim(),
            });
        }
        let replaced = replace_non_finite(&mut similarity);
        if replaced > 0 {
            log::warn!(
                "Similarity '{}' produced {} non-finite values; replaced with 0",
                self.similarity.name(),
                replaced
            );
        }
        log::debug!(
            "Computed {}x{} {} similarity matrix in {:.2?}",
            subjects.len(),
            subjects.len(),
            self.similarity.name(),
            sim_start.elapsed()
        );

        self.fitted = Some(Fitted {
            subjects,
            targets,
            subject_means: normalized.subject_means,
            centered,
            by_subject,
            similarity,
        });

        log::info!(
            "Fitted neighborhood model (k={}, similarity={}) in {:.2?}",
            self.config.k,
            self.similarity.name(),
            start.elapsed()
        );
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn ratings(&self) -> &RatingSet {
        &self.ratings
    }

    pub fn similarity_name(&self) -> &str {
        self.similarity.name()
    }

    /// `max(subject id) + 1` over the ratings.
    pub fn subject_count(&self) -> usize {
        self.ratings.subject_count()
    }

    /// `max(target id) + 1` over the ratings.
    pub fn target_count(&self) -> usize {
        self.ratings.target_count()
    }

    /// A new, unfitted model over the same ratings with subject and target
    /// swapped.
    pub fn transposed(&self) -> Result<NeighborhoodModel> {
        NeighborhoodModel::new(self.ratings.transpose(), self.config.clone())
    }

    /// Mean rating of `subject`; 0 for a subject without ratings.
    pub fn subject_mean(&self, subject: u32) -> Result<f64> {
        let fitted = self.state()?;
        self.check_subject(subject)?;
        Ok(fitted.mean(fitted.subjects.position(subject)))
    }

    /// Centered rating of `target` by `subject`, if observed.
    pub fn centered_value(&self, target: u32, subject: u32) -> Result<Option<f64>> {
        let fitted = self.state()?;
        let value = match (
            fitted.targets.position(target),
            fitted.subjects.position(subject),
        ) {
            (Some(t), Some(s)) => fitted.centered.get(t, s),
            _ => None,
        };
        Ok(value)
    }

    /// Similarity between two subjects; 0 if either has no ratings.
    pub fn similarity(&self, a: u32, b: u32) -> Result<f64> {
        let fitted = self.state()?;
        self.check_subject(a)?;
        self.check_subject(b)?;
        Ok(fitted.sim(fitted.subjects.position(a), fitted.subjects.position(b)))
    }

    /// The dense similarity matrix over subjects that have ratings, in
    /// ascending subject id order (see [`NeighborhoodModel::fitted_subjects`]).
    pub fn similarity_matrix(&self) -> Result<&Array2<f64>> {
        Ok(&self.state()?.similarity)
    }

    /// Subject ids with at least one rating, ascending; row order of
    /// [`NeighborhoodModel::similarity_matrix`].
    pub fn fitted_subjects(&self) -> Result<&[u32]> {
        Ok(self.state()?.subjects.ids())
    }

    /// Subjects that rated `target`, ascending.
    pub fn raters(&self, target: u32) -> Result<Vec<u32>> {
        let fitted = self.state()?;
        Ok(match fitted.targets.position(target) {
            Some(t) => fitted
                .centered
                .row(t)
                .indices()
                .iter()
                .map(|&s| fitted.subjects.id(s))
                .collect(),
            None => Vec::new(),
        })
    }

    /// Targets rated by `subject`, ascending.
    pub fn rated_targets(&self, subject: u32) -> Result<Vec<u32>> {
        let fitted = self.state()?;
        self.check_subject(subject)?;
        Ok(match fitted.subjects.position(subject) {
            Some(s) => fitted
                .by_subject
                .row(s)
                .indices()
                .iter()
                .map(|&t| fitted.targets.id(t))
                .collect(),
            None => Vec::new(),
        })
    }

    /// The at most `k` raters of `target` most similar to `subject`, most
    /// similar first.
    pub fn neighbors(&self, subject: u32, target: u32) -> Result<Vec<Neighbor>> {
        let fitted = self.state()?;
        self.check_subject(subject)?;
        let t = fitted
            .targets
            .position(target)
            .ok_or(CfError::EmptyRaterSet { target })?;
        let selected = fitted.select_neighbors(fitted.subjects.position(subject), t, self.config.k);
        if selected.is_empty() {
            return Err(CfError::EmptyRaterSet { target });
        }
        Ok(selected
            .into_iter()
            .map(|(pos, similarity, centered)| Neighbor {
                subject: fitted.subjects.id(pos),
                similarity,
                centered,
            })
            .collect())
    }

    /// Predict the rating `subject` would give `target`.
    ///
    /// The k most similar raters of `target` are combined as
    /// `Σ centered·sim / (Σ |sim| + EPSILON)` and the subject mean is added back.
    /// The result is not clamped to any rating scale.
    ///
    /// # Errors
    ///
    /// * `UninitializedModel` before `fit`.
    /// * `UnknownSubject` when `subject >= subject_count()`.
    /// * `EmptyRaterSet` when nobody rated `target`.
    pub fn predict(&self, subject: u32, target: u32) -> Result<f64> {
        let fitted = self.state()?;
        self.check_subject(subject)?;
        let t = fitted
            .targets
            .position(target)
            .ok_or(CfError::EmptyRaterSet { target })?;
        let prediction = fitted
            .predict_position(fitted.subjects.position(subject), t, self.config.k)
            .ok_or(CfError::EmptyRaterSet { target })?;
        log::trace!(
            "predict(subject={}, target={}) = {}",
            subject,
            target,
            prediction
        );
        Ok(prediction)
    }

    /// Predict a batch of `(subject, target)` pairs in parallel. Results are in
    /// input order.
    pub fn predict_many(&self, pairs: &[(u32, u32)]) -> Vec<Result<f64>> {
        pairs
            .par_iter()
            .map(|&(subject, target)| self.predict(subject, target))
            .collect()
    }

    /// Top `top_k` unrated targets for `subject`, best first.
    pub fn recommend(&self, subject: u32, top_k: usize) -> Result<Vec<u32>> {
        Ok(self
            .recommend_scored(subject, top_k)?
            .into_iter()
            .map(|(target, _)| target)
            .collect())
    }

    /// Like [`NeighborhoodModel::recommend`] but keeps the predicted scores.
    ///
    /// Every target the subject has not rated is scored. Targets in
    /// `0..target_count()` that nobody rated have no prediction and are left
    /// out. Equal scores keep ascending target id order.
    pub fn recommend_scored(&self, subject: u32, top_k: usize) -> Result<Vec<(u32, f64)>> {
        let fitted = self.state()?;
        self.check_subject(subject)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let s = fitted.subjects.position(subject);
        let rated: &[usize] = match s {
            Some(s) => fitted.by_subject.row(s).indices(),
            None => &[],
        };

        let mut scored: Vec<(u32, f64)> = (0..fitted.targets.len())
            .into_par_iter()
            .filter(|t| rated.binary_search(t).is_err())
            .filter_map(|t| {
                fitted
                    .predict_position(s, t, self.config.k)
                    .map(|score| (fitted.targets.id(t), score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        log::trace!(
            "recommend(subject={}) scored {} candidates",
            subject,
            fitted.targets.len() - rated.len()
        );
        Ok(scored)
    }

    fn state(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(CfError::UninitializedModel)
    }

    fn check_subject(&self, subject: u32) -> Result<()> {
        if subject as usize >= self.subject_count() {
            return Err(CfError::UnknownSubject {
                subject,
                subject_count: self.subject_count(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for NeighborhoodModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeighborhoodModel")
            .field("ratings", &self.ratings.len())
            .field("config", &self.config)
            .field("similarity", &self.similarity.name())
            .field("fitted", &self.is_fitted())
            .finish()
    }
}

impl Fitted {
    fn mean(&self, subject: Option<usize>) -> f64 {
        subject.map(|s| self.subject_means[s]).unwrap_or(0.0)
    }

    fn sim(&self, a: Option<usize>, b: Option<usize>) -> f64 {
        match (a, b) {
            (Some(a), Some(b)) => self.similarity[(a, b)],
            _ => 0.0,
        }
    }

    /// `(rater position, similarity, centered rating)` for the k most similar
    /// raters of target position `t`. Equal similarities keep rater order.
    fn select_neighbors(
        &self,
        subject: Option<usize>,
        t: usize,
        k: usize,
    ) -> Vec<(usize, f64, f64)> {
        let mut candidates: Vec<(usize, f64, f64)> = self
            .centered
            .row(t)
            .iter()
            .map(|(rater, centered)| (rater, self.sim(subject, Some(rater)), centered))
            .collect();

        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        candidates.truncate(k);
        candidates
    }

    /// `None` when target position `t` has no raters.
    fn predict_position(&self, subject: Option<usize>, t: usize, k: usize) -> Option<f64> {
        let neighbors = self.select_neighbors(subject, t, k);
        if neighbors.is_empty() {
            return None;
        }

        let (num, den) = neighbors
            .iter()
            .fold((0.0f64, 0.0f64), |(num, den), &(_, sim, centered)| {
                (num + centered * sim, den + sim.abs())
            });

        Some(num / (den + EPSILON) + self.mean(subject))
    }
}
