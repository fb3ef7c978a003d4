//! Integration tests for role handling, pluggable similarity and evaluation.

use cfknn_core::evaluation::{
    evaluate, hit_rate, leave_one_out, mae, rmse, train_test_split, EvaluationOptions,
};
use cfknn_core::similarity::{cosine_similarity, FnSimilarity};
use cfknn_core::{ModelConfig, Rating, RatingSet, Recommender, Role};

fn user_item(users: u32, items: u32) -> RatingSet {
    let mut ratings = Vec::new();
    for u in 0..users {
        for i in 0..items {
            if (u * 5 + i * 3) % 7 < 4 {
                let value = ((u + 2 * i) % 5) as f64 + 1.0;
                ratings.push(Rating::new(u, i, value));
            }
        }
    }
    RatingSet::new(ratings).unwrap()
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[test]
fn user_user_and_item_item_agree_on_shape() {
    let ratings = user_item(9, 6);
    let uu = Recommender::fit(&ratings, ModelConfig::default()).unwrap();
    let ii = Recommender::fit(&ratings, ModelConfig::default().with_role(Role::ItemItem)).unwrap();

    assert_eq!(uu.user_count(), ii.user_count());
    assert_eq!(uu.item_count(), ii.item_count());
    assert_eq!(ii.model().subject_count(), 6);
    for user in 0..9 {
        assert_eq!(uu.rated_items(user).unwrap(), ii.rated_items(user).unwrap());
    }
}

#[test]
fn item_item_recommendations_exclude_rated_items() {
    let ratings = user_item(10, 8);
    let rec = Recommender::fit(&ratings, ModelConfig::default().with_role(Role::ItemItem)).unwrap();
    for user in 0..10 {
        let rated = rec.rated_items(user).unwrap();
        let scored = rec.recommend_items_scored(user, 3).unwrap();
        assert!(scored.len() <= 3);
        for (item, score) in &scored {
            assert!(!rated.contains(item));
            assert_eq!(*score, rec.predict(user, *item).unwrap());
        }
        for pair in scored.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}

// ---------------------------------------------------------------------------
// Pluggable similarity
// ---------------------------------------------------------------------------

#[test]
fn dense_cosine_plugin_matches_builtin() {
    let ratings = user_item(12, 7);
    let builtin = Recommender::fit(&ratings, ModelConfig::default()).unwrap();
    let plugged = Recommender::fit_with_similarity(
        &ratings,
        ModelConfig::default(),
        Box::new(FnSimilarity::new("dense-cosine", cosine_similarity)),
    )
    .unwrap();

    assert_eq!(plugged.model().similarity_name(), "dense-cosine");
    for user in 0..12 {
        for item in 0..7 {
            let a = builtin.predict(user, item).unwrap();
            let b = plugged.predict(user, item).unwrap();
            assert!((a - b).abs() < 1e-6, "({}, {}): {} vs {}", user, item, a, b);
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation harness
// ---------------------------------------------------------------------------

#[test]
fn metrics_skip_unpredictable_cases() {
    let ratings = user_item(8, 8);
    let rec = Recommender::fit(&ratings, ModelConfig::default()).unwrap();
    let test = vec![
        Rating::new(0, 0, 3.0),
        Rating::new(0, 50, 3.0),
        Rating::new(60, 0, 3.0),
    ];

    let r = rmse(&rec, &test);
    let m = mae(&rec, &test);
    assert_eq!(r.evaluated, 1);
    assert_eq!(r.skipped, 2);
    assert_eq!(m.evaluated, 1);
    assert!((r.value.unwrap() - m.value.unwrap()).abs() < 1e-12);
}

#[test]
fn item_item_metrics_skip_unknown_users_and_items() {
    let ratings = user_item(8, 8);
    let rec = Recommender::fit(&ratings, ModelConfig::default().with_role(Role::ItemItem)).unwrap();
    // Item 50 is not a fitted subject. User 60 rated nothing, so item 0 has
    // no rater to borrow from for them.
    let test = vec![
        Rating::new(0, 0, 3.0),
        Rating::new(0, 50, 3.0),
        Rating::new(60, 0, 3.0),
    ];

    let r = rmse(&rec, &test);
    let m = mae(&rec, &test);
    assert_eq!((r.evaluated, r.skipped), (1, 2));
    assert_eq!((m.evaluated, m.skipped), (1, 2));

    let hr = hit_rate(&rec, &test, 5);
    assert_eq!(hr.evaluated, 2);
    assert_eq!(hr.skipped, 1);
}

#[test]
fn item_item_evaluation_accounts_for_every_case() {
    let ratings = user_item(20, 12);
    let config = ModelConfig::default().with_role(Role::ItemItem).with_k(8);
    let options = EvaluationOptions::default();
    let report = evaluate(&ratings, &config, &options).unwrap();

    let holdout = train_test_split(&ratings, options.test_fraction, options.seed).unwrap();
    assert_eq!(report.rmse.evaluated + report.rmse.skipped, holdout.test.len());
    assert_eq!(report.mae.evaluated, report.rmse.evaluated);
    assert_eq!(report.mae.skipped, report.rmse.skipped);
    assert!(report.rmse.evaluated > 0);

    let train_rec = Recommender::fit(&holdout.train, config.clone()).unwrap();
    assert_eq!(report.rmse, rmse(&train_rec, &holdout.test));

    let loo = leave_one_out(&ratings, options.seed);
    let hr = report.hit_rate.unwrap();
    assert_eq!(hr.evaluated + hr.skipped, loo.test.len());
    assert_eq!(report.config.role, Role::ItemItem);
}

#[test]
fn hit_rate_counts_items_in_top_k() {
    let ratings = user_item(15, 10);
    let loo = leave_one_out(&ratings, 11);
    let rec = Recommender::fit(&loo.train, ModelConfig::default()).unwrap();

    // A list as long as the catalog always contains the held-out item.
    let full = hit_rate(&rec, &loo.test, 10);
    assert_eq!(full.value, Some(1.0));
    assert_eq!(full.evaluated, loo.test.len());

    let none = hit_rate(&rec, &loo.test, 0);
    assert_eq!(none.value, Some(0.0));
}

#[test]
fn evaluation_is_reproducible() {
    let ratings = user_item(20, 12);
    let config = ModelConfig::default().with_k(8);
    let options = EvaluationOptions {
        top_k: 5,
        ..EvaluationOptions::default()
    };
    let first = evaluate(&ratings, &config, &options).unwrap();
    let second = evaluate(&ratings, &config, &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.ratings, ratings.len());
    assert!(first.hit_rate.is_some());
}

#[test]
fn evaluation_can_skip_hit_rate() {
    let options = EvaluationOptions {
        skip_hit_rate: true,
        ..EvaluationOptions::default()
    };
    let report = evaluate(&user_item(10, 10), &ModelConfig::default(), &options).unwrap();
    assert!(report.hit_rate.is_none());
    assert!(report.rmse.evaluated > 0);
}
