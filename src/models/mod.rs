use serde::{Deserialize, Serialize};

mod similarity;
mod taste_map;

pub use similarity::{
    BatchProgress, BatchSummary, CanonicalPair, ComputeSource, PairError, ProfileSnapshot,
    RatingPatternDetail, SimilarUser, SimilarityResult, SimilarityScoreRecord,
    SimilarityScoreStats,
};
pub use taste_map::{
    BehaviorProfile, ComputedMetrics, GenreProfile, PersonProfiles, RatingDistribution, TasteMap,
};

/// Content classification used for metadata lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

/// Lifecycle state of a watch-history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Want,
    Watched,
    Rewatched,
    Dropped,
    InProgress,
}

impl WatchStatus {
    /// States that count as having actually watched the content
    pub fn is_completed(&self) -> bool {
        matches!(self, WatchStatus::Watched | WatchStatus::Rewatched)
    }
}

/// A single cast credit on a piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
}

/// A single crew credit on a piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

/// Genre and credit metadata for one piece of content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub genres: Vec<String>,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
}

/// One entry in a user's watch history
///
/// Owned by the watch-history collaborator and read-only to this crate.
/// `user_rating` is the user's explicit score; `fallback_rating` is the
/// community average used when the user never rated the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedItem {
    pub content_id: String,
    pub media_type: MediaType,
    pub user_rating: Option<f64>,
    pub fallback_rating: f64,
    pub status: WatchStatus,
    pub watch_count: u32,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

impl WatchedItem {
    /// Rating used for profile weighting: the user's own score when present,
    /// otherwise the community fallback.
    pub fn effective_rating(&self) -> f64 {
        self.user_rating.unwrap_or(self.fallback_rating)
    }
}

/// Per-status counts of a user's watch history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub want: i64,
    pub watched: i64,
    pub rewatched: i64,
    pub dropped: i64,
    pub in_progress: i64,
}
