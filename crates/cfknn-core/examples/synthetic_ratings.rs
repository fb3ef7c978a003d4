use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cfknn_core::evaluation::{evaluate, EvaluationOptions};
use cfknn_core::{ModelConfig, Rating, RatingSet, Recommender, Role, SimilarityKind};

/// Users belong to one of three taste groups; each group likes a different
/// third of the catalog.
fn synthetic_ratings(users: u32, items: u32, density: f64, seed: u64) -> Result<RatingSet> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ratings = Vec::new();
    for user in 0..users {
        let group = user % 3;
        for item in 0..items {
            if rng.gen::<f64>() > density {
                continue;
            }
            let liked = item % 3 == group;
            let base = if liked { 4.5 } else { 2.0 };
            let value: f64 = (base + rng.gen_range(-1.0..1.0_f64)).clamp(1.0, 5.0);
            ratings.push(Rating::new(user, item, value.round()));
        }
    }
    Ok(RatingSet::new(ratings)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ratings = synthetic_ratings(300, 120, 0.15, 7)?;
    println!(
        "{} ratings over {} users and {} items",
        ratings.len(),
        ratings.subject_count(),
        ratings.target_count()
    );

    for role in [Role::UserUser, Role::ItemItem] {
        for similarity in [SimilarityKind::Cosine, SimilarityKind::Pearson] {
            let config = ModelConfig::default()
                .with_k(20)
                .with_role(role)
                .with_similarity(similarity);
            let report = evaluate(&ratings, &config, &EvaluationOptions::default())?;
            println!(
                "{:<9} {:<8} RMSE {:.4}  MAE {:.4}  HR@10 {:.4}",
                role.to_string(),
                similarity.to_string(),
                report.rmse.value.unwrap_or(f64::NAN),
                report.mae.value.unwrap_or(f64::NAN),
                report
                    .hit_rate
                    .and_then(|hr| hr.value)
                    .unwrap_or(f64::NAN)
            );
        }
    }

    let recommender = Recommender::fit(&ratings, ModelConfig::default().with_k(20))?;
    let top = recommender.recommend_items_scored(0, 5)?;
    println!("Top items for user 0 (group 0 likes items divisible by 3):");
    for (item, score) in top {
        println!("  item {:>3}  {:.3}", item, score);
    }
    Ok(())
}
