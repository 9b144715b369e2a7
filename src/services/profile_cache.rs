use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::TasteMap,
    services::profile::ProfileBuilder,
};

/// How long a cached taste map stays valid
pub const TASTE_MAP_TTL: u64 = 86_400; // 24 hours

/// Anything that can produce a user's current taste map
///
/// The similarity services depend on this seam rather than on the concrete
/// cache so comparisons can be tested against fixed profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TasteMapSource: Send + Sync {
    async fn get_or_compute(&self, user_id: Uuid) -> AppResult<TasteMap>;
}

/// Cache-aside wrapper around [`ProfileBuilder`]
///
/// Reads go through Redis with a 24h TTL; a miss (or an unavailable cache,
/// which degrades to a miss) triggers a rebuild from source data. Duplicate
/// concurrent rebuilds for the same user are tolerated: the builder is pure,
/// so the writes race to the same value.
#[derive(Clone)]
pub struct ProfileCache {
    cache: Cache,
    builder: Arc<ProfileBuilder>,
    refresh_tx: mpsc::UnboundedSender<Uuid>,
}

/// Handle for gracefully shutting down the background refresh worker
pub struct RefreshWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshWorkerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Profile refresh worker shutdown signal sent");
    }
}

impl ProfileCache {
    /// Creates the cache wrapper and spawns its refresh worker
    ///
    /// The worker owns the fire-and-forget rebuilds queued by
    /// [`ProfileCache::notify_watch_history_changed`]; its failures are
    /// logged in its own error domain and never reach a request path.
    pub fn new(cache: Cache, builder: Arc<ProfileBuilder>) -> (Self, RefreshWorkerHandle) {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker_cache = cache.clone();
        let worker_builder = Arc::clone(&builder);
        tokio::spawn(async move {
            Self::refresh_worker_task(worker_cache, worker_builder, refresh_rx, shutdown_rx).await;
        });

        (
            Self {
                cache,
                builder,
                refresh_tx,
            },
            RefreshWorkerHandle { shutdown_tx },
        )
    }

    /// Drops the cached taste map for one user
    pub async fn invalidate(&self, user_id: Uuid) {
        self.cache.invalidate(&CacheKey::TasteMap(user_id)).await;
    }

    /// Reacts to a watch-history mutation: invalidate now, rebuild soon
    ///
    /// The rebuild is handed to the refresh worker and must never block or
    /// fail the triggering request; a full worker queue is only logged.
    pub async fn notify_watch_history_changed(&self, user_id: Uuid) {
        self.invalidate(user_id).await;

        if let Err(e) = self.refresh_tx.send(user_id) {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to queue profile refresh");
        }
    }

    /// Builds the taste map, going through the cache first
    async fn build_through_cache(&self, user_id: Uuid) -> AppResult<TasteMap> {
        cached!(
            self.cache,
            CacheKey::TasteMap(user_id),
            TASTE_MAP_TTL,
            async { self.builder.build(user_id).await }
        )
    }

    /// Background task that rebuilds taste maps after watch-history mutations
    async fn refresh_worker_task(
        cache: Cache,
        builder: Arc<ProfileBuilder>,
        mut refresh_rx: mpsc::UnboundedReceiver<Uuid>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Profile refresh worker started");

        loop {
            tokio::select! {
                Some(user_id) = refresh_rx.recv() => {
                    match builder.build(user_id).await {
                        Ok(taste_map) => {
                            cache.set_in_background(
                                &CacheKey::TasteMap(user_id),
                                &taste_map,
                                TASTE_MAP_TTL,
                            );
                            tracing::debug!(user_id = %user_id, "Refreshed taste map in background");
                        }
                        Err(e) => {
                            tracing::warn!(
                                user_id = %user_id,
                                error = %e,
                                "Background taste map refresh failed"
                            );
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Profile refresh worker stopped");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl TasteMapSource for ProfileCache {
    /// Returns the user's taste map, computing it on a cache miss
    async fn get_or_compute(&self, user_id: Uuid) -> AppResult<TasteMap> {
        self.build_through_cache(user_id).await
    }
}
