//! Integration tests for the fitted neighborhood model's structural guarantees.

use cfknn_core::error::CfError;
use cfknn_core::model::{NeighborhoodModel, EPSILON};
use cfknn_core::{ModelConfig, Rating, RatingSet, SimilarityKind};

fn scenario() -> RatingSet {
    RatingSet::new(vec![
        Rating::new(0, 0, 5.0),
        Rating::new(0, 1, 3.0),
        Rating::new(1, 0, 4.0),
        Rating::new(1, 1, 4.0),
        Rating::new(2, 0, 1.0),
    ])
    .unwrap()
}

/// A small deterministic dataset with varied overlap between subjects.
fn synthetic(subjects: u32, targets: u32) -> RatingSet {
    let mut ratings = Vec::new();
    for s in 0..subjects {
        for t in 0..targets {
            if (s * 31 + t * 17) % 4 != 0 {
                let value = ((s * 13 + t * 7) % 5) as f64 + 1.0;
                ratings.push(Rating::new(s, t, value));
            }
        }
    }
    RatingSet::new(ratings).unwrap()
}

fn fit(ratings: RatingSet, config: ModelConfig) -> NeighborhoodModel {
    let mut model = NeighborhoodModel::new(ratings, config).unwrap();
    model.fit().unwrap();
    model
}

fn assert_structural_invariants(model: &NeighborhoodModel) {
    // Normalization identity.
    for rating in model.ratings() {
        let centered = model
            .centered_value(rating.target, rating.subject)
            .unwrap()
            .expect("every rating has a centered entry");
        let mean = model.subject_mean(rating.subject).unwrap();
        assert!(
            (centered + mean - rating.value).abs() < 1e-9,
            "rating ({}, {}) does not round-trip",
            rating.subject,
            rating.target
        );
    }

    // Symmetric and finite similarity matrix.
    let sim = model.similarity_matrix().unwrap();
    let n = sim.nrows();
    assert_eq!(sim.ncols(), n);
    for i in 0..n {
        for j in 0..n {
            assert!(sim[(i, j)].is_finite());
            assert_eq!(sim[(i, j)], sim[(j, i)], "asymmetric at ({}, {})", i, j);
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[test]
fn scenario_matches_expected_values() {
    let model = fit(scenario(), ModelConfig::default());
    assert_eq!(model.subject_count(), 3);
    assert_eq!(model.target_count(), 2);
    assert_eq!(model.subject_mean(0).unwrap(), 4.0);
    assert_eq!(model.subject_mean(1).unwrap(), 4.0);
    assert_eq!(model.subject_mean(2).unwrap(), 1.0);
    assert_eq!(model.centered_value(0, 0).unwrap(), Some(1.0));
    assert_eq!(model.centered_value(1, 0).unwrap(), Some(-1.0));

    let p = model.predict(2, 1).unwrap();
    assert!(p.is_finite());
}

#[test]
fn normalization_identity_holds_on_synthetic_data() {
    let model = fit(synthetic(20, 15), ModelConfig::default());
    assert_structural_invariants(&model);
}

#[test]
fn subject_without_ratings_has_zero_mean_and_no_entries() {
    // Subject 2 never rates anything; subject 3 fixes the id range.
    let ratings = RatingSet::new(vec![
        Rating::new(0, 0, 5.0),
        Rating::new(0, 1, 1.0),
        Rating::new(1, 0, 4.0),
        Rating::new(1, 1, 2.0),
        Rating::new(3, 0, 3.0),
    ])
    .unwrap();
    let model = fit(ratings, ModelConfig::default());

    assert_eq!(model.subject_count(), 4);
    assert_eq!(model.subject_mean(2).unwrap(), 0.0);
    assert!(model.rated_targets(2).unwrap().is_empty());
    assert_eq!(model.centered_value(0, 2).unwrap(), None);
    assert_eq!(model.centered_value(1, 2).unwrap(), None);
    assert_eq!(model.similarity(2, 2).unwrap(), 0.0);
    assert!(!model.fitted_subjects().unwrap().contains(&2));

    // With every similarity 0 the weighted signal is 0 and the mean adds 0.
    let p = model.predict(2, 1).unwrap();
    assert_eq!(p, 0.0);
}

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

#[test]
fn self_similarity_is_one_or_zero() {
    let mut ratings = synthetic(10, 8).to_vec();
    // Subject 10 rates at its own mean everywhere, so its centered vector is zero.
    ratings.push(Rating::new(10, 0, 3.0));
    ratings.push(Rating::new(10, 1, 3.0));
    let model = fit(RatingSet::new(ratings).unwrap(), ModelConfig::default());

    for s in 0..10 {
        assert_eq!(model.similarity(s, s).unwrap(), 1.0, "subject {}", s);
    }
    assert_eq!(model.similarity(10, 10).unwrap(), 0.0);
}

#[test]
fn every_builtin_similarity_keeps_invariants() {
    for kind in [
        SimilarityKind::Cosine,
        SimilarityKind::Pearson,
        SimilarityKind::Jaccard,
    ] {
        let model = fit(
            synthetic(12, 9),
            ModelConfig::default().with_similarity(kind),
        );
        assert_eq!(model.similarity_name(), kind.to_string());
        assert_structural_invariants(&model);
    }
}

#[test]
fn extreme_rating_magnitudes_keep_similarity_finite() {
    for v in [1e200, 1e-200] {
        let ratings = RatingSet::new(vec![
            Rating::new(0, 0, v),
            Rating::new(0, 1, -v),
            Rating::new(1, 0, v),
            Rating::new(1, 1, -v),
            Rating::new(1, 2, 0.0),
        ])
        .unwrap();

        let model = fit(ratings.clone(), ModelConfig::default());
        assert_eq!(model.similarity(0, 0).unwrap(), 1.0, "magnitude {:e}", v);
        assert_eq!(model.similarity(0, 1).unwrap(), 1.0, "magnitude {:e}", v);
        assert_eq!(model.predict(0, 2).unwrap(), 0.0, "magnitude {:e}", v);
        assert_structural_invariants(&model);

        let pearson = fit(
            ratings,
            ModelConfig::default().with_similarity(SimilarityKind::Pearson),
        );
        assert!(pearson.predict(0, 2).unwrap().is_finite());
        assert_structural_invariants(&pearson);
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

#[test]
fn predictions_are_deterministic() {
    let model = fit(synthetic(15, 10), ModelConfig::default().with_k(5));
    for s in 0..15 {
        for t in 0..10 {
            let first = model.predict(s, t).unwrap();
            let second = model.predict(s, t).unwrap();
            assert_eq!(first.to_bits(), second.to_bits());
        }
    }
}

#[test]
fn fewer_raters_than_k_uses_all_of_them() {
    let model = fit(scenario(), ModelConfig::default().with_k(100));
    let neighbors = model.neighbors(2, 0).unwrap();
    assert_eq!(neighbors.len(), 3);
    assert!(model.predict(2, 0).is_ok());
}

#[test]
fn k_neighbors_are_the_most_similar_raters() {
    let model = fit(synthetic(20, 12), ModelConfig::default().with_k(3));
    let neighbors = model.neighbors(0, 5).unwrap();
    assert_eq!(neighbors.len(), 3);

    let weakest_selected = neighbors
        .iter()
        .map(|n| n.similarity)
        .fold(f64::INFINITY, f64::min);
    for rater in model.raters(5).unwrap() {
        if neighbors.iter().all(|n| n.subject != rater) {
            assert!(model.similarity(0, rater).unwrap() <= weakest_selected);
        }
    }

    let num: f64 = neighbors.iter().map(|n| n.centered * n.similarity).sum();
    let den: f64 = neighbors.iter().map(|n| n.similarity.abs()).sum::<f64>() + EPSILON;
    let expected = num / den + model.subject_mean(0).unwrap();
    assert!((model.predict(0, 5).unwrap() - expected).abs() < 1e-9);
}

#[test]
fn predictions_are_not_clamped() {
    // Subject 1 averages 4.5 and its only neighbor on target 2 sits well
    // above its own mean, pushing the prediction past the 1..5 scale.
    let ratings = RatingSet::new(vec![
        Rating::new(0, 0, 5.0),
        Rating::new(0, 1, 1.0),
        Rating::new(0, 2, 5.0),
        Rating::new(1, 0, 5.0),
        Rating::new(1, 1, 4.0),
    ])
    .unwrap();
    let model = fit(ratings, ModelConfig::default());
    let p = model.predict(1, 2).unwrap();
    assert!(p > 5.0, "prediction {} was clamped", p);
}

#[test]
fn target_without_raters_is_an_explicit_error() {
    let model = fit(scenario(), ModelConfig::default());
    assert_eq!(model.predict(0, 2), Err(CfError::EmptyRaterSet { target: 2 }));
}

#[test]
fn unfitted_model_rejects_every_query() {
    let model = NeighborhoodModel::new(scenario(), ModelConfig::default()).unwrap();
    assert!(!model.is_fitted());
    assert_eq!(model.predict(0, 0), Err(CfError::UninitializedModel));
    assert_eq!(model.recommend(0, 1), Err(CfError::UninitializedModel));
    assert_eq!(model.raters(0), Err(CfError::UninitializedModel));
    assert_eq!(model.similarity(0, 1), Err(CfError::UninitializedModel));
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[test]
fn recommendations_exclude_rated_and_are_sorted() {
    let model = fit(synthetic(25, 20), ModelConfig::default().with_k(10));
    for s in 0..25 {
        let rated = model.rated_targets(s).unwrap();
        let scored = model.recommend_scored(s, 5).unwrap();
        assert!(scored.len() <= 5);
        for (target, _) in &scored {
            assert!(!rated.contains(target), "subject {} got rated target {}", s, target);
        }
        for pair in scored.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        for (target, score) in &scored {
            assert_eq!(*score, model.predict(s, *target).unwrap());
        }
    }
}

#[test]
fn recommend_returns_fewer_when_catalog_is_small() {
    let model = fit(scenario(), ModelConfig::default());
    assert_eq!(model.recommend(2, 10).unwrap(), vec![1]);
}

#[test]
fn ties_keep_ascending_target_order() {
    // Subject 0 has a zero centered vector, so every candidate scores its mean.
    let ratings = RatingSet::new(vec![
        Rating::new(0, 0, 2.0),
        Rating::new(1, 1, 4.0),
        Rating::new(1, 2, 5.0),
        Rating::new(1, 3, 3.0),
    ])
    .unwrap();
    let model = fit(ratings, ModelConfig::default());
    assert_eq!(model.recommend(0, 3).unwrap(), vec![1, 2, 3]);
}

// ---------------------------------------------------------------------------
// Role symmetry
// ---------------------------------------------------------------------------

#[test]
fn transposed_refit_keeps_invariants() {
    let model = fit(synthetic(14, 9), ModelConfig::default());
    let mut transposed = model.transposed().unwrap();
    transposed.fit().unwrap();

    assert_eq!(transposed.subject_count(), model.target_count());
    assert_eq!(transposed.target_count(), model.subject_count());
    assert_structural_invariants(&transposed);
}
