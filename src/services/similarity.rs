use crate::models::{
    GenreProfile, PersonProfiles, RatingPatternDetail, SimilarityResult, TasteMap, WatchedItem,
};
use std::collections::{HashMap, HashSet};

/// Weight of genre-profile cosine similarity in the overall match
pub const TASTE_WEIGHT: f64 = 0.5;
/// Weight of the normalized rating correlation in the overall match
pub const RATING_WEIGHT: f64 = 0.3;
/// Weight of favorite-person overlap in the overall match
pub const PERSON_WEIGHT: f64 = 0.2;

/// Taste-similarity threshold above which two users count as a match.
/// Deliberately gates on the taste component alone, not the composite score.
pub const SIMILAR_TASTE_THRESHOLD: f64 = 0.7;

/// Largest absolute rating difference still counted as a "close" match
pub const CLOSE_MATCH_MAX_DIFF: f64 = 1.0;
/// Largest absolute rating difference still counted as a "moderate" match
pub const MODERATE_MATCH_MAX_DIFF: f64 = 2.0;
/// Width, on the 0-10 rating scale, within which two genre scores count as
/// aligned in the detailed breakdown
pub const GENRE_INTENSITY_BRACKET: f64 = 0.4;

/// Cosine similarity between two genre profiles, in [0,1]
///
/// Vectors are built over the union of genre keys present in either profile,
/// with an absent key contributing 0. Returns 0 when either magnitude is
/// zero, which covers the both-empty case.
pub fn cosine_similarity(a: &GenreProfile, b: &GenreProfile) -> f64 {
    let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for key in keys {
        let va = a.get(key).copied().unwrap_or(0.0);
        let vb = b.get(key).copied().unwrap_or(0.0);
        dot += va * vb;
        norm_a += va * va;
        norm_b += vb * vb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

/// Pearson correlation between two paired rating vectors, in [-1,1]
///
/// The vectors must cover the same set of shared movies, index-aligned.
/// Returns 0 for fewer than 2 shared points, mismatched lengths, or zero
/// variance on either side.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }

    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Set of person names with a positive score across both credit maps
fn favorite_persons(profiles: &PersonProfiles) -> HashSet<&String> {
    profiles
        .actors
        .iter()
        .chain(profiles.directors.iter())
        .filter(|(_, score)| **score > 0.0)
        .map(|(name, _)| name)
        .collect()
}

/// Jaccard overlap of favorite persons, in [0,1]
///
/// Sets are restricted to persons with score > 0 in each profile. When both
/// sets are empty the result is 1.0, a vacuous full match; this is the one
/// canonical definition used everywhere.
pub fn jaccard_person_overlap(a: &PersonProfiles, b: &PersonProfiles) -> f64 {
    let set_a = favorite_persons(a);
    let set_b = favorite_persons(b);

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();

    intersection as f64 / union as f64
}

/// Maps a correlation in [-1,1] onto [0,1]
fn normalize_correlation(r: f64) -> f64 {
    (r + 1.0) / 2.0
}

/// Weighted combination of the three similarity components, in [0,1]
///
/// The weights are fixed constants, not configurable per call.
pub fn overall_match(taste_similarity: f64, rating_correlation: f64, person_overlap: f64) -> f64 {
    TASTE_WEIGHT * taste_similarity
        + RATING_WEIGHT * normalize_correlation(rating_correlation)
        + PERSON_WEIGHT * person_overlap
}

/// Whether a result counts as a match for "similar users" listings
///
/// Gates on taste similarity alone: two users with correlated ratings but
/// disjoint genre tastes are not considered similar.
pub fn is_similar(result: &SimilarityResult) -> bool {
    result.taste_similarity > SIMILAR_TASTE_THRESHOLD
}

/// Intensity bracket index for a rating: {1-3, 4-5, 6-7, 8-9, 10}
fn intensity_bracket(rating: f64) -> u8 {
    if rating <= 3.0 {
        0
    } else if rating <= 5.0 {
        1
    } else if rating <= 7.0 {
        2
    } else if rating <= 9.0 {
        3
    } else {
        4
    }
}

/// Builds the extended rating-pattern breakdown over shared-movie rating pairs
///
/// Each pair is bucketed by absolute difference, and each rating is
/// independently bucketed into intensity brackets to count pairs landing in
/// the same bracket. Genre alignment counts shared genres whose scores, on
/// the 0-10 scale, sit within [`GENRE_INTENSITY_BRACKET`] of each other.
pub fn rating_pattern_detail(
    shared_ratings: &[(f64, f64)],
    genres_a: &GenreProfile,
    genres_b: &GenreProfile,
) -> RatingPatternDetail {
    let mut detail = RatingPatternDetail {
        total_shared: shared_ratings.len(),
        ..RatingPatternDetail::default()
    };

    for (genre, score_a) in genres_a {
        if let Some(score_b) = genres_b.get(genre) {
            if (score_a / 10.0 - score_b / 10.0).abs() <= GENRE_INTENSITY_BRACKET {
                detail.shared_genre_matches += 1;
            }
        }
    }

    if shared_ratings.is_empty() {
        return detail;
    }

    for (ra, rb) in shared_ratings {
        let diff = (ra - rb).abs();
        if diff == 0.0 {
            detail.perfect_match += 1;
        } else if diff <= CLOSE_MATCH_MAX_DIFF {
            detail.close_match += 1;
        } else if diff <= MODERATE_MATCH_MAX_DIFF {
            detail.moderate_match += 1;
        } else {
            detail.large_difference += 1;
        }

        if intensity_bracket(*ra) == intensity_bracket(*rb) {
            detail.same_intensity += 1;
        } else {
            detail.different_intensity += 1;
        }
    }

    let n = shared_ratings.len() as f64;
    let mean_a = shared_ratings.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = shared_ratings.iter().map(|(_, b)| b).sum::<f64>() / n;

    detail.intensity_match = (1.0 - (mean_a - mean_b).abs() / 10.0).clamp(0.0, 1.0);
    detail.overall_movie_match = (detail.perfect_match + detail.close_match) as f64 / n;

    detail
}

/// Rating pairs over the completed content ids both users have watched
///
/// Uses the effective rating (user rating when present, community fallback
/// otherwise), consistent with how profiles are weighted.
pub fn shared_ratings(items_a: &[WatchedItem], items_b: &[WatchedItem]) -> Vec<(f64, f64)> {
    let rated_b: HashMap<&str, f64> = items_b
        .iter()
        .filter(|item| item.status.is_completed())
        .map(|item| (item.content_id.as_str(), item.effective_rating()))
        .collect();

    items_a
        .iter()
        .filter(|item| item.status.is_completed())
        .filter_map(|item| {
            rated_b
                .get(item.content_id.as_str())
                .map(|rb| (item.effective_rating(), *rb))
        })
        .collect()
}

/// Compares two taste maps into a [`SimilarityResult`]
///
/// Either side with no watch history at all produces the all-zero result:
/// "no data yet" is never an error, and the vacuous person-overlap match
/// cannot inflate a pair nobody has data for.
pub fn compare(
    map_a: &TasteMap,
    map_b: &TasteMap,
    shared: &[(f64, f64)],
    include_detail: bool,
) -> SimilarityResult {
    if !map_a.has_history() || !map_b.has_history() {
        return SimilarityResult::zero();
    }

    let taste_similarity = cosine_similarity(&map_a.genres, &map_b.genres);
    let rating_correlation = {
        let xs: Vec<f64> = shared.iter().map(|(a, _)| *a).collect();
        let ys: Vec<f64> = shared.iter().map(|(_, b)| *b).collect();
        pearson_correlation(&xs, &ys)
    };
    let person_overlap = jaccard_person_overlap(&map_a.persons, &map_b.persons);

    let detail = include_detail
        .then(|| rating_pattern_detail(shared, &map_a.genres, &map_b.genres));

    SimilarityResult {
        taste_similarity,
        rating_correlation,
        person_overlap,
        overall_match: overall_match(taste_similarity, rating_correlation, person_overlap),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaType, WatchStatus};
    use uuid::Uuid;

    fn profile(entries: &[(&str, f64)]) -> GenreProfile {
        entries
            .iter()
            .map(|(name, score)| (name.to_string(), *score))
            .collect()
    }

    fn persons(actors: &[&str], directors: &[&str]) -> PersonProfiles {
        PersonProfiles {
            actors: actors.iter().map(|name| (name.to_string(), 80.0)).collect(),
            directors: directors
                .iter()
                .map(|name| (name.to_string(), 80.0))
                .collect(),
        }
    }

    fn item(content_id: &str, rating: f64, status: WatchStatus) -> WatchedItem {
        WatchedItem {
            content_id: content_id.to_string(),
            media_type: MediaType::Movie,
            user_rating: Some(rating),
            fallback_rating: 5.0,
            status,
            watch_count: 1,
            genres: vec![],
            cast: vec![],
            crew: vec![],
        }
    }

    #[test]
    fn test_cosine_identity() {
        let a = profile(&[("action", 80.0), ("comedy", 60.0), ("drama", 40.0)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_symmetry() {
        let a = profile(&[("action", 80.0), ("comedy", 60.0)]);
        let b = profile(&[("action", 20.0), ("horror", 90.0)]);
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_empty_profiles() {
        assert_eq!(cosine_similarity(&GenreProfile::new(), &GenreProfile::new()), 0.0);
    }

    #[test]
    fn test_cosine_one_empty_profile() {
        let a = profile(&[("action", 80.0)]);
        assert_eq!(cosine_similarity(&a, &GenreProfile::new()), 0.0);
    }

    #[test]
    fn test_cosine_disjoint_profiles() {
        let a = profile(&[("action", 80.0)]);
        let b = profile(&[("romance", 80.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_worked_example() {
        // [80,60] . [85,30] = 8600; |A| = 100, |B| = sqrt(8125)
        let a = profile(&[("action", 80.0), ("comedy", 60.0)]);
        let b = profile(&[("action", 85.0), ("comedy", 30.0)]);
        let expected = 8600.0 / (100.0 * 8125.0_f64.sqrt());
        assert!((cosine_similarity(&a, &b) - expected).abs() < 1e-12);
        assert!((cosine_similarity(&a, &b) - 0.954).abs() < 0.001);
    }

    #[test]
    fn test_pearson_self_correlation() {
        let xs = vec![1.0, 5.0, 7.0, 9.0];
        assert!((pearson_correlation(&xs, &xs) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_inverse_correlation() {
        let xs = vec![1.0, 2.0, 3.0];
        let ys = vec![9.0, 8.0, 7.0];
        assert!((pearson_correlation(&xs, &ys) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_too_few_points() {
        assert_eq!(pearson_correlation(&[5.0], &[5.0]), 0.0);
        assert_eq!(pearson_correlation(&[], &[]), 0.0);
    }

    #[test]
    fn test_pearson_zero_variance() {
        let flat = vec![7.0, 7.0, 7.0];
        let varied = vec![1.0, 5.0, 9.0];
        assert_eq!(pearson_correlation(&flat, &varied), 0.0);
    }

    #[test]
    fn test_pearson_mismatched_lengths() {
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_jaccard_identity() {
        let p = persons(&["Nolan Fan", "Other Actor"], &["Some Director"]);
        assert_eq!(jaccard_person_overlap(&p, &p), 1.0);
    }

    #[test]
    fn test_jaccard_both_empty_is_vacuous_match() {
        let empty = PersonProfiles::default();
        assert_eq!(jaccard_person_overlap(&empty, &empty), 1.0);
    }

    #[test]
    fn test_jaccard_one_empty() {
        let p = persons(&["Actor A"], &[]);
        let empty = PersonProfiles::default();
        assert_eq!(jaccard_person_overlap(&p, &empty), 0.0);
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        let a = persons(&["Actor A", "Actor B"], &[]);
        let b = persons(&["Actor B", "Actor C"], &[]);
        // intersection 1, union 3
        assert!((jaccard_person_overlap(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard_ignores_zero_scores() {
        let mut a = persons(&["Actor A"], &[]);
        a.actors.insert("Zero Actor".to_string(), 0.0);
        let b = persons(&["Actor A"], &[]);
        assert_eq!(jaccard_person_overlap(&a, &b), 1.0);
    }

    #[test]
    fn test_overall_match_weights() {
        // taste 1, correlation 1 (normalizes to 1), overlap 1 => 1.0
        assert!((overall_match(1.0, 1.0, 1.0) - 1.0).abs() < 1e-12);
        // all zero with correlation -1 (normalizes to 0) => 0.0
        assert_eq!(overall_match(0.0, -1.0, 0.0), 0.0);
        // zero correlation normalizes to 0.5
        assert!((overall_match(0.0, 0.0, 0.0) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_overall_match_monotone_in_each_component() {
        let base = overall_match(0.4, 0.2, 0.6);
        assert!(overall_match(0.5, 0.2, 0.6) > base);
        assert!(overall_match(0.4, 0.3, 0.6) > base);
        assert!(overall_match(0.4, 0.2, 0.7) > base);
    }

    #[test]
    fn test_is_similar_gates_on_taste_not_overall() {
        let high_taste = SimilarityResult {
            taste_similarity: 0.75,
            rating_correlation: -1.0,
            person_overlap: 0.0,
            overall_match: overall_match(0.75, -1.0, 0.0),
            detail: None,
        };
        assert!(is_similar(&high_taste));

        let high_overall = SimilarityResult {
            taste_similarity: 0.5,
            rating_correlation: 1.0,
            person_overlap: 1.0,
            overall_match: overall_match(0.5, 1.0, 1.0),
            detail: None,
        };
        assert!(high_overall.overall_match > high_taste.overall_match);
        assert!(!is_similar(&high_overall));
    }

    #[test]
    fn test_rating_pattern_worked_example() {
        // 10 shared movies: 6 with diff 0, 2 with diff 1, 2 with diff 3
        let mut pairs = vec![(8.0, 8.0); 6];
        pairs.extend([(7.0, 8.0), (6.0, 5.0)]);
        pairs.extend([(9.0, 6.0), (2.0, 5.0)]);

        let detail = rating_pattern_detail(&pairs, &GenreProfile::new(), &GenreProfile::new());

        assert_eq!(detail.total_shared, 10);
        assert_eq!(detail.perfect_match, 6);
        assert_eq!(detail.close_match, 2);
        assert_eq!(detail.moderate_match, 0);
        assert_eq!(detail.large_difference, 2);
        assert!((detail.overall_movie_match - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_rating_pattern_intensity_brackets() {
        // 8 and 9 share a bracket; 3 and 4 do not
        let pairs = vec![(8.0, 9.0), (3.0, 4.0)];
        let detail = rating_pattern_detail(&pairs, &GenreProfile::new(), &GenreProfile::new());

        assert_eq!(detail.same_intensity, 1);
        assert_eq!(detail.different_intensity, 1);
    }

    #[test]
    fn test_rating_pattern_intensity_match() {
        let pairs = vec![(8.0, 6.0), (6.0, 4.0)];
        let detail = rating_pattern_detail(&pairs, &GenreProfile::new(), &GenreProfile::new());
        // means 7 and 5 => 1 - 2/10
        assert!((detail.intensity_match - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_rating_pattern_empty() {
        let detail = rating_pattern_detail(&[], &GenreProfile::new(), &GenreProfile::new());
        assert_eq!(detail.total_shared, 0);
        assert_eq!(detail.overall_movie_match, 0.0);
    }

    #[test]
    fn test_rating_pattern_genre_alignment() {
        // 80 vs 83 is within the 0.4 bracket on the 0-10 scale, 60 vs 20 is not
        let a = profile(&[("action", 80.0), ("comedy", 60.0)]);
        let b = profile(&[("action", 83.0), ("comedy", 20.0), ("horror", 50.0)]);
        let detail = rating_pattern_detail(&[], &a, &b);
        assert_eq!(detail.shared_genre_matches, 1);
    }

    #[test]
    fn test_shared_ratings_joins_completed_items() {
        let items_a = vec![
            item("m1", 8.0, WatchStatus::Watched),
            item("m2", 6.0, WatchStatus::Want),
            item("m3", 7.0, WatchStatus::Rewatched),
        ];
        let items_b = vec![
            item("m1", 9.0, WatchStatus::Watched),
            item("m2", 6.0, WatchStatus::Watched),
            item("m3", 5.0, WatchStatus::Dropped),
        ];

        let mut shared = shared_ratings(&items_a, &items_b);
        shared.sort_by(|x, y| x.partial_cmp(y).unwrap());

        // m2 excluded (A only wanted it), m3 excluded (B dropped it)
        assert_eq!(shared, vec![(8.0, 9.0)]);
    }

    #[test]
    fn test_compare_no_history_is_all_zero() {
        let empty = TasteMap::empty(Uuid::new_v4());
        let mut full = TasteMap::empty(Uuid::new_v4());
        full.genres = profile(&[("action", 80.0)]);
        full.item_count = 3;

        let result = compare(&empty, &full, &[], true);
        assert_eq!(result, SimilarityResult::zero());
    }

    #[test]
    fn test_compare_assembles_components() {
        let mut a = TasteMap::empty(Uuid::new_v4());
        a.genres = profile(&[("action", 80.0), ("comedy", 60.0)]);
        a.persons = persons(&["Actor A"], &[]);
        a.item_count = 5;

        let mut b = TasteMap::empty(Uuid::new_v4());
        b.genres = profile(&[("action", 85.0), ("comedy", 30.0)]);
        b.persons = persons(&["Actor A"], &[]);
        b.item_count = 4;

        let shared = vec![(8.0, 7.0), (6.0, 5.0), (9.0, 9.0)];
        let result = compare(&a, &b, &shared, true);

        assert!(result.taste_similarity > 0.9);
        assert_eq!(result.person_overlap, 1.0);
        assert!(result.rating_correlation > 0.0);
        assert!(result.detail.is_some());
        assert_eq!(result.detail.unwrap().total_shared, 3);

        let without_detail = compare(&a, &b, &shared, false);
        assert!(without_detail.detail.is_none());
    }
}
