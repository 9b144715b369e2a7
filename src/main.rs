use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tastematch::config::Config;
use tastematch::db::{create_pool, create_redis_client, Cache};
use tastematch::services::{
    BatchScheduler, PgCandidateSelector, PostgresWatchHistory, ProfileBuilder, ProfileCache,
    SimilarityScoreService, TmdbProvider,
};

/// Batch worker: runs one population-wide similarity computation pass,
/// page by page, then shuts the background workers down cleanly.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let history = Arc::new(PostgresWatchHistory::new(pool.clone()));
    let metadata = Arc::new(TmdbProvider::new(
        cache.clone(),
        config.metadata_api_key.clone(),
        config.metadata_api_url.clone(),
    ));

    let builder = Arc::new(ProfileBuilder::new(history.clone(), metadata));
    let (profiles, refresh_handle) = ProfileCache::new(cache, builder);

    let scorer = Arc::new(SimilarityScoreService::new(
        pool.clone(),
        Arc::new(profiles),
        history,
    ));
    let selector = Arc::new(PgCandidateSelector::new(pool));

    let scheduler = BatchScheduler::new(selector, scorer, config.batch_concurrency);

    let page_size = config.batch_page_size;
    let mut offset = 0;

    loop {
        let summary = scheduler
            .run(
                page_size,
                offset,
                Some(Box::new(|progress| {
                    tracing::info!(
                        users = progress.users_processed,
                        pairs = progress.pairs_computed,
                        errors = progress.errors,
                        "Batch progress"
                    );
                })),
            )
            .await?;

        tracing::info!(
            offset,
            users = summary.users_processed,
            pairs = summary.pairs_computed,
            errors = summary.errors,
            pairs_per_second = summary.pairs_per_second,
            "Completed batch page"
        );

        if (summary.users_processed as i64) < page_size {
            break;
        }
        offset += page_size;
    }

    refresh_handle.shutdown().await;
    cache_handle.shutdown().await;

    Ok(())
}
