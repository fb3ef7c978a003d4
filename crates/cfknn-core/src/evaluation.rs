//! Offline evaluation: hold-out splits, RMSE/MAE and hit rate at K.
//!
//! All ratings here are in user/item orientation (`subject` = user,
//! `target` = item); the [`Recommender`] applies the configured role. A held-out
//! case whose prediction fails (for example an item nobody in the training split
//! rated) is skipped and counted, never fatal.
use std::collections::BTreeMap;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{CfError, Result};
use crate::ratings::{Rating, RatingSet};
use crate::recommender::Recommender;

/// Training ratings plus the held-out cases to score against.
#[derive(Debug, Clone)]
pub struct Holdout {
    pub train: RatingSet,
    pub test: Vec<Rating>,
}

/// Aggregated metric over held-out cases. `value` is `None` when no case could
/// be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub value: Option<f64>,
    pub evaluated: usize,
    pub skipped: usize,
}

/// Randomly hold out `test_fraction` of the ratings.
///
/// The split is reproducible for a given `seed`. Training ratings keep their
/// original relative order.
pub fn train_test_split(ratings: &RatingSet, test_fraction: f64, seed: u64) -> Result<Holdout> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(CfError::InvalidConfig(format!(
            "test_fraction must be in [0, 1), got {}",
            test_fraction
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..ratings.len()).collect();
    indices.shuffle(&mut rng);

    let n_test = (ratings.len() as f64 * test_fraction).round() as usize;
    let (test_idx, train_idx) = indices.split_at(n_test);

    let mut train_idx = train_idx.to_vec();
    train_idx.sort_unstable();
    let test = test_idx.iter().map(|&i| ratings.as_slice()[i]).collect();

    Ok(Holdout {
        train: ratings.select(&train_idx),
        test,
    })
}

/// Hold out one random rating per user that has at least two ratings.
///
/// Users with a single rating stay entirely in the training split so they
/// still have a profile.
pub fn leave_one_out(ratings: &RatingSet, seed: u64) -> Holdout {
    let mut by_user: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, rating) in ratings.iter().enumerate() {
        by_user.entry(rating.subject).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut held_out = Vec::new();
    for rows in by_user.values() {
        if rows.len() >= 2 {
            held_out.push(rows[rng.gen_range(0..rows.len())]);
        }
    }
    held_out.sort_unstable();

    let train_idx: Vec<usize> = (0..ratings.len())
        .filter(|i| held_out.binary_search(i).is_err())
        .collect();

    Holdout {
        train: ratings.select(&train_idx),
        test: held_out.iter().map(|&i| ratings.as_slice()[i]).collect(),
    }
}

/// Root mean squared error of predictions over `test`.
pub fn rmse(recommender: &Recommender, test: &[Rating]) -> MetricResult {
    let (errors, skipped) = prediction_errors(recommender, test);
    let value = if errors.is_empty() {
        None
    } else {
        Some((errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt())
    };
    MetricResult {
        value,
        evaluated: errors.len(),
        skipped,
    }
}

/// Mean absolute error of predictions over `test`.
pub fn mae(recommender: &Recommender, test: &[Rating]) -> MetricResult {
    let (errors, skipped) = prediction_errors(recommender, test);
    let value = if errors.is_empty() {
        None
    } else {
        Some(errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64)
    };
    MetricResult {
        value,
        evaluated: errors.len(),
        skipped,
    }
}

/// Fraction of held-out cases whose item appears in the user's top-`k` list.
pub fn hit_rate(recommender: &Recommender, test: &[Rating], k: usize) -> MetricResult {
    let outcomes: Vec<Option<bool>> = test
        .par_iter()
        .map(|case| match recommender.recommend_items(case.subject, k) {
            Ok(items) => Some(items.contains(&case.target)),
            Err(e) => {
                log::debug!(
                    "Skipping hit-rate case (user={}, item={}): {}",
                    case.subject,
                    case.target,
                    e
                );
                None
            }
        })
        .collect();

    let evaluated = outcomes.iter().filter(|o| o.is_some()).count();
    let hits = outcomes.iter().filter(|o| **o == Some(true)).count();
    MetricResult {
        value: if evaluated == 0 {
            None
        } else {
            Some(hits as f64 / evaluated as f64)
        },
        evaluated,
        skipped: test.len() - evaluated,
    }
}

/// Signed prediction errors for every case that could be predicted, plus the
/// number of skipped cases.
fn prediction_errors(recommender: &Recommender, test: &[Rating]) -> (Vec<f64>, usize) {
    let results: Vec<Option<f64>> = test
        .par_iter()
        .map(|case| match recommender.predict(case.subject, case.target) {
            Ok(prediction) => Some(prediction - case.value),
            Err(e) => {
                log::debug!(
                    "Skipping prediction case (user={}, item={}): {}",
                    case.subject,
                    case.target,
                    e
                );
                None
            }
        })
        .collect();

    let errors: Vec<f64> = results.into_iter().flatten().collect();
    let skipped = test.len() - errors.len();
    (errors, skipped)
}

/// Knobs for [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Fraction of ratings held out for RMSE/MAE.
    pub test_fraction: f64,
    /// List length for the hit rate.
    pub top_k: usize,
    pub seed: u64,
    /// Skip the leave-one-out hit-rate pass, which scores the whole catalog once
    /// per user.
    pub skip_hit_rate: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            top_k: 10,
            seed: 42,
            skip_hit_rate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub config: ModelConfig,
    pub options: EvaluationOptions,
    pub ratings: usize,
    pub rmse: MetricResult,
    pub mae: MetricResult,
    pub hit_rate: Option<MetricResult>,
}

/// Fit on a random hold-out split to measure RMSE and MAE, then on a
/// leave-one-out split to measure HR@K.
pub fn evaluate(
    ratings: &RatingSet,
    config: &ModelConfig,
    options: &EvaluationOptions,
) -> Result<EvaluationReport> {
    config.validate()?;

    let start = Instant::now();
    let holdout = train_test_split(ratings, options.test_fraction, options.seed)?;
    log::info!(
        "Hold-out split: {} train / {} test ratings",
        holdout.train.len(),
        holdout.test.len()
    );
    let recommender = Recommender::fit(&holdout.train, config.clone())?;
    let rmse = rmse(&recommender, &holdout.test);
    let mae = mae(&recommender, &holdout.test);
    log::info!(
        "RMSE {:?} / MAE {:?} over {} cases ({} skipped) in {:.2?}",
        rmse.value,
        mae.value,
        rmse.evaluated,
        rmse.skipped,
        start.elapsed()
    );

    let hit_rate = if options.skip_hit_rate {
        None
    } else {
        let start = Instant::now();
        let loo = leave_one_out(ratings, options.seed);
        let recommender = Recommender::fit(&loo.train, config.clone())?;
        let hr = hit_rate(&recommender, &loo.test, options.top_k);
        log::info!(
            "HR@{} {:?} over {} users ({} skipped) in {:.2?}",
            options.top_k,
            hr.value,
            hr.evaluated,
            hr.skipped,
            start.elapsed()
        );
        Some(hr)
    };

    Ok(EvaluationReport {
        config: config.clone(),
        options: options.clone(),
        ratings: ratings.len(),
        rmse,
        mae,
        hit_rate,
    })
}
