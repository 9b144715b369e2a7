pub mod batch;
pub mod candidates;
pub mod profile;
pub mod profile_cache;
pub mod providers;
pub mod scores;
pub mod similarity;
pub mod watch_history;

pub use batch::BatchScheduler;
pub use candidates::{CandidateSelector, PgCandidateSelector};
pub use profile::ProfileBuilder;
pub use profile_cache::{ProfileCache, TasteMapSource};
pub use providers::{MetadataProvider, TmdbProvider};
pub use scores::{PairScorer, SimilarityScoreService};
pub use watch_history::{PostgresWatchHistory, WatchHistorySource};
