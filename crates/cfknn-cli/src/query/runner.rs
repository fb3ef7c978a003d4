use anyhow::{Context, Result};
use cfknn_core::io::read_ratings;
use cfknn_core::Recommender;

use super::input::QueryConfig;

pub fn fit_recommender(config: &QueryConfig) -> Result<Recommender> {
    let ratings = read_ratings(&config.ratings)?;
    Recommender::fit(&ratings, config.model.clone())
        .with_context(|| format!("Failed to fit model on {}", config.ratings))
}

/// Top `top_k` unrated items for the configured user, with scores.
pub fn run_recommend(config: &QueryConfig, top_k: usize) -> Result<Vec<(u32, f64)>> {
    let recommender = fit_recommender(config)?;
    let recommendations = recommender
        .recommend_items_scored(config.user, top_k)
        .with_context(|| format!("Failed to recommend for user {}", config.user))?;
    log::info!(
        "Recommended {} items for user {}",
        recommendations.len(),
        config.user
    );
    Ok(recommendations)
}

pub fn run_predict(config: &QueryConfig, item: u32) -> Result<f64> {
    let recommender = fit_recommender(config)?;
    recommender
        .predict(config.user, item)
        .with_context(|| format!("Failed to predict user {} / item {}", config.user, item))
}
