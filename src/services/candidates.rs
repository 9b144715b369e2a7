use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// One user worth comparing against, with the overlap that ranked them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub user_id: Uuid,
    pub shared_count: i64,
}

/// Narrows the universe of user pairs worth comparing
///
/// Candidate lists are capped and ranked by shared completed content, which
/// keeps the batch workload near-linear instead of all-pairs over the
/// population.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateSelector: Send + Sync {
    /// Users with at least `min_watch_count` completed items, at least one
    /// of which was added within the trailing `days_back` window
    async fn active_users(
        &self,
        min_watch_count: i64,
        days_back: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Uuid>>;

    /// Users sharing at least one completed content id with `user_id`,
    /// ranked descending by shared-item count, capped at `limit`
    async fn candidates_for(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Candidate>>;
}

/// Candidate selection backed by the shared Postgres watch-history schema
pub struct PgCandidateSelector {
    pool: PgPool,
}

impl PgCandidateSelector {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateSelector for PgCandidateSelector {
    async fn active_users(
        &self,
        min_watch_count: i64,
        days_back: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Uuid>> {
        let cutoff = Utc::now() - Duration::days(days_back);

        // Ordered by user id so (limit, offset) pages are stable across a run
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM watch_history
            WHERE status IN ('watched', 'rewatched')
            GROUP BY user_id
            HAVING COUNT(*) >= $1 AND MAX(added_at) >= $2
            ORDER BY user_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(min_watch_count)
        .bind(cutoff)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    async fn candidates_for(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<Candidate>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT other.user_id, COUNT(*) AS shared_count
            FROM watch_history mine
            JOIN watch_history other
              ON other.content_id = mine.content_id
             AND other.user_id <> mine.user_id
            WHERE mine.user_id = $1
              AND mine.status IN ('watched', 'rewatched')
              AND other.status IN ('watched', 'rewatched')
            GROUP BY other.user_id
            ORDER BY shared_count DESC, other.user_id
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            user_id = %user_id,
            candidates = rows.len(),
            "Selected comparison candidates"
        );

        Ok(rows
            .into_iter()
            .map(|(user_id, shared_count)| Candidate {
                user_id,
                shared_count,
            })
            .collect())
    }
}
