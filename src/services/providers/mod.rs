/// Content metadata provider abstraction
///
/// This module provides a pluggable architecture for genre/credit metadata
/// sources. Lookups are per-item and may report a title as unavailable;
/// callers degrade that item's contribution rather than aborting.
use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{ContentMetadata, MediaType},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for content metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch genres and top cast/crew for one piece of content
    ///
    /// Returns `Ok(None)` when the provider has no record of the content.
    /// Transport and provider errors surface as `Err`; callers decide how
    /// far the failure propagates.
    async fn lookup(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<ContentMetadata>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
