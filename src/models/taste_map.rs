use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Per-genre preference score on a 0-100 scale
///
/// Recomputed wholesale on every profile build; a genre with no watched
/// items is simply absent, never stored as zero.
pub type GenreProfile = HashMap<String, f64>;

/// Per-person preference scores, split by credit type
///
/// Each map is truncated to the top 50 persons by weighted rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonProfiles {
    pub actors: HashMap<String, f64>,
    pub directors: HashMap<String, f64>,
}

/// Breakdown of rated items into high / medium / low buckets, as percentages
///
/// Sums to ~100 for any non-empty rated set; all zero when the user has no
/// rated items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingDistribution {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

/// Viewing-behavior rates derived from status counts, each in [0,100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub rewatch_rate: f64,
    pub drop_rate: f64,
    pub completion_rate: f64,
}

impl Default for BehaviorProfile {
    /// Zero-history default: nothing rewatched or dropped, and a full
    /// completion rate rather than a 0/0 division.
    fn default() -> Self {
        Self {
            rewatch_rate: 0.0,
            drop_rate: 0.0,
            completion_rate: 100.0,
        }
    }
}

/// Metrics derived from the genre profile and rating distribution, each in [0,100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedMetrics {
    pub positive_intensity: f64,
    pub negative_intensity: f64,
    pub consistency: f64,
    pub diversity: f64,
}

/// The full aggregate preference profile computed for one user
///
/// A pure function of the user's watch history and content metadata: the
/// same inputs always produce the same map (modulo `updated_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteMap {
    pub user_id: Uuid,
    pub genres: GenreProfile,
    pub persons: PersonProfiles,
    pub rating_distribution: RatingDistribution,
    pub average_rating: f64,
    pub behavior: BehaviorProfile,
    pub metrics: ComputedMetrics,
    pub item_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl TasteMap {
    /// Fully-defined default profile for a user with no watch history
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            genres: GenreProfile::new(),
            persons: PersonProfiles::default(),
            rating_distribution: RatingDistribution::default(),
            average_rating: 0.0,
            behavior: BehaviorProfile::default(),
            metrics: ComputedMetrics::default(),
            item_count: 0,
            updated_at: Utc::now(),
        }
    }

    /// Whether the profile was built from any watch history at all
    pub fn has_history(&self) -> bool {
        self.item_count > 0
    }
}
