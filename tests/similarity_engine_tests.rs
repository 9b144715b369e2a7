use std::collections::HashMap;

use tastematch::models::{
    GenreProfile, MediaType, PersonProfiles, StatusCounts, TasteMap, WatchStatus, WatchedItem,
};
use tastematch::services::profile::{
    compute_average_rating, compute_behavior_profile, compute_genre_profile, compute_metrics,
    compute_person_profile, compute_rating_distribution, PersonType,
};
use tastematch::services::similarity::{
    compare, cosine_similarity, is_similar, jaccard_person_overlap, overall_match,
    pearson_correlation, rating_pattern_detail, shared_ratings,
};
use uuid::Uuid;

fn item(content_id: &str, rating: Option<f64>, genres: &[&str], status: WatchStatus) -> WatchedItem {
    WatchedItem {
        content_id: content_id.to_string(),
        media_type: MediaType::Movie,
        user_rating: rating,
        fallback_rating: 6.0,
        status,
        watch_count: 1,
        genres: genres.iter().map(|g| g.to_string()).collect(),
        cast: vec![],
        crew: vec![],
    }
}

fn taste_map_for(user_id: Uuid, items: &[WatchedItem]) -> TasteMap {
    let genres = compute_genre_profile(items);
    let rating_distribution = compute_rating_distribution(items);
    let metrics = compute_metrics(&genres, &rating_distribution);

    TasteMap {
        user_id,
        persons: PersonProfiles {
            actors: compute_person_profile(items, PersonType::Actor),
            directors: compute_person_profile(items, PersonType::Director),
        },
        average_rating: compute_average_rating(items),
        behavior: compute_behavior_profile(&StatusCounts::default()),
        item_count: items.len(),
        updated_at: chrono::Utc::now(),
        genres,
        rating_distribution,
        metrics,
    }
}

#[test]
fn profile_build_and_comparison_end_to_end() {
    let items_a = vec![
        item("m1", Some(9.0), &["action", "thriller"], WatchStatus::Watched),
        item("m2", Some(8.0), &["action"], WatchStatus::Rewatched),
        item("m3", Some(4.0), &["romance"], WatchStatus::Watched),
    ];
    let items_b = vec![
        item("m1", Some(8.0), &["action", "thriller"], WatchStatus::Watched),
        item("m2", Some(9.0), &["action"], WatchStatus::Watched),
        item("m4", Some(7.0), &["comedy"], WatchStatus::Watched),
    ];

    let map_a = taste_map_for(Uuid::new_v4(), &items_a);
    let map_b = taste_map_for(Uuid::new_v4(), &items_b);

    let shared = shared_ratings(&items_a, &items_b);
    assert_eq!(shared.len(), 2);

    let result = compare(&map_a, &map_b, &shared, true);

    assert!(result.taste_similarity > 0.0 && result.taste_similarity <= 1.0);
    assert!(result.overall_match > 0.0 && result.overall_match <= 1.0);

    let detail = result.detail.expect("detail requested");
    assert_eq!(detail.total_shared, 2);
    // Both shared movies differ by exactly 1 point
    assert_eq!(detail.close_match, 2);
    assert_eq!(detail.overall_movie_match, 1.0);
}

#[test]
fn identical_users_score_as_full_match() {
    let items = vec![
        item("m1", Some(9.0), &["action"], WatchStatus::Watched),
        item("m2", Some(7.0), &["drama"], WatchStatus::Watched),
        item("m3", Some(5.0), &["drama", "comedy"], WatchStatus::Watched),
    ];

    let map_a = taste_map_for(Uuid::new_v4(), &items);
    let map_b = taste_map_for(Uuid::new_v4(), &items);

    let shared = shared_ratings(&items, &items);
    let result = compare(&map_a, &map_b, &shared, false);

    assert!((result.taste_similarity - 1.0).abs() < 1e-9);
    assert!((result.rating_correlation - 1.0).abs() < 1e-9);
    assert_eq!(result.person_overlap, 1.0);
    assert!((result.overall_match - 1.0).abs() < 1e-9);
    assert!(is_similar(&result));
}

#[test]
fn rating_distribution_sums_to_one_hundred() {
    let items: Vec<WatchedItem> = (0..7)
        .map(|i| {
            item(
                &format!("m{}", i),
                Some(3.0 + i as f64),
                &[],
                WatchStatus::Watched,
            )
        })
        .collect();

    let dist = compute_rating_distribution(&items);
    assert!((dist.high + dist.medium + dist.low - 100.0).abs() < 1e-9);
}

#[test]
fn engine_edge_cases_hold_together() {
    let empty = GenreProfile::new();
    assert_eq!(cosine_similarity(&empty, &empty), 0.0);
    assert_eq!(pearson_correlation(&[8.0], &[8.0]), 0.0);
    assert_eq!(
        jaccard_person_overlap(&PersonProfiles::default(), &PersonProfiles::default()),
        1.0
    );

    // Monotonicity of the weighted combination
    assert!(overall_match(0.9, 0.0, 0.0) > overall_match(0.8, 0.0, 0.0));
    assert!(overall_match(0.0, 0.9, 0.0) > overall_match(0.0, 0.8, 0.0));
    assert!(overall_match(0.0, 0.0, 0.9) > overall_match(0.0, 0.0, 0.8));
}

#[test]
fn detail_breakdown_handles_mixed_ratings() {
    let mut genres_a: HashMap<String, f64> = HashMap::new();
    genres_a.insert("action".to_string(), 82.0);
    let mut genres_b: HashMap<String, f64> = HashMap::new();
    genres_b.insert("action".to_string(), 80.0);

    let pairs = vec![(10.0, 10.0), (8.0, 7.0), (6.0, 4.0), (9.0, 3.0)];
    let detail = rating_pattern_detail(&pairs, &genres_a, &genres_b);

    assert_eq!(detail.perfect_match, 1);
    assert_eq!(detail.close_match, 1);
    assert_eq!(detail.moderate_match, 1);
    assert_eq!(detail.large_difference, 1);
    assert_eq!(detail.shared_genre_matches, 1);
    assert_eq!(detail.overall_movie_match, 0.5);
}
