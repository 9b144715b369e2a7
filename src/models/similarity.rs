use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::taste_map::{GenreProfile, PersonProfiles};

/// What triggered a similarity computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeSource {
    Scheduler,
    Manual,
    OnDemand,
}

impl ComputeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeSource::Scheduler => "scheduler",
            ComputeSource::Manual => "manual",
            ComputeSource::OnDemand => "on_demand",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduler" => Some(ComputeSource::Scheduler),
            "manual" => Some(ComputeSource::Manual),
            "on_demand" => Some(ComputeSource::OnDemand),
            _ => None,
        }
    }
}

/// Deterministic ordering of two user ids so that one stored record exists
/// per unordered pair regardless of query direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalPair {
    pub a: Uuid,
    pub b: Uuid,
}

impl CanonicalPair {
    /// Orders the two ids so `a < b`
    pub fn new(x: Uuid, y: Uuid) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }
}

/// Extended per-pair rating-pattern breakdown for detailed comparison views
///
/// Shared-movie rating pairs are bucketed by absolute difference, and each
/// rating is independently bucketed into intensity brackets to count pairs
/// landing in the same bracket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingPatternDetail {
    pub total_shared: usize,
    pub perfect_match: usize,
    pub close_match: usize,
    pub moderate_match: usize,
    pub large_difference: usize,
    pub same_intensity: usize,
    pub different_intensity: usize,
    /// 1 - |mean_a - mean_b| / 10
    pub intensity_match: f64,
    /// (perfect + close) / total_shared
    pub overall_movie_match: f64,
    /// Shared genres whose normalized scores sit within the genre bracket
    pub shared_genre_matches: usize,
}

/// Result of comparing two users' taste maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// Cosine similarity over genre profiles, in [0,1]
    pub taste_similarity: f64,
    /// Pearson correlation over shared-movie ratings, in [-1,1]
    pub rating_correlation: f64,
    /// Jaccard overlap of favorite persons, in [0,1]
    pub person_overlap: f64,
    /// Weighted combination of the three components, in [0,1]
    pub overall_match: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RatingPatternDetail>,
}

impl SimilarityResult {
    /// The "no data yet" result used when either user has no watch history
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reproducibility snapshot of one user's profiles at compute time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub genres: GenreProfile,
    pub persons: PersonProfiles,
}

/// Durable pairwise similarity score, keyed by the canonical unordered pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScoreRecord {
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub taste_similarity: f64,
    pub rating_correlation: f64,
    pub person_overlap: f64,
    pub overall_match: f64,
    pub detail: Option<RatingPatternDetail>,
    pub snapshot_a: ProfileSnapshot,
    pub snapshot_b: ProfileSnapshot,
    pub computed_at: DateTime<Utc>,
    pub computed_by: ComputeSource,
}

/// One entry of a "users most similar to X" listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarUser {
    pub user_id: Uuid,
    pub overall_match: f64,
}

/// Operational statistics over the stored similarity scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityScoreStats {
    pub total_scores: i64,
    pub distinct_users: i64,
    pub mean_overall_match: f64,
    pub latest_computed_at: Option<DateTime<Utc>>,
}

/// A failure recorded during a batch run
///
/// `user_b` is set for pair-scoring failures; per-user failures such as a
/// candidate lookup error carry only `user_a`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairError {
    pub user_a: Uuid,
    pub user_b: Option<Uuid>,
    pub message: String,
}

/// Periodic progress snapshot passed to a batch run's callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub users_processed: usize,
    pub pairs_computed: usize,
    pub errors: usize,
}

/// Final summary of one batch similarity run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub users_processed: usize,
    pub pairs_computed: usize,
    pub errors: usize,
    /// First few per-pair failures, capped so a pathological run cannot
    /// balloon the summary
    pub error_samples: Vec<PairError>,
    pub duration_ms: u128,
    pub pairs_per_second: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_pair_orders_ids() {
        let low = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let high = Uuid::parse_str("ffffffff-0000-0000-0000-000000000000").unwrap();

        let forward = CanonicalPair::new(low, high);
        let backward = CanonicalPair::new(high, low);

        assert_eq!(forward, backward);
        assert_eq!(forward.a, low);
        assert_eq!(forward.b, high);
    }

    #[test]
    fn test_canonical_pair_same_user() {
        let id = Uuid::new_v4();
        let pair = CanonicalPair::new(id, id);
        assert_eq!(pair.a, pair.b);
    }

    #[test]
    fn test_compute_source_round_trip() {
        for source in [
            ComputeSource::Scheduler,
            ComputeSource::Manual,
            ComputeSource::OnDemand,
        ] {
            assert_eq!(ComputeSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(ComputeSource::parse("cron"), None);
    }

    #[test]
    fn test_zero_result_is_all_zero() {
        let result = SimilarityResult::zero();
        assert_eq!(result.taste_similarity, 0.0);
        assert_eq!(result.rating_correlation, 0.0);
        assert_eq!(result.person_overlap, 0.0);
        assert_eq!(result.overall_match, 0.0);
        assert!(result.detail.is_none());
    }
}
