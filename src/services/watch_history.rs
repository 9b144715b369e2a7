use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{MediaType, StatusCounts, WatchStatus, WatchedItem},
};

/// Source of a user's watch-history records
///
/// The watch history itself is owned by an external collaborator; this crate
/// only reads it. Genre and credit fields may be empty on the raw records,
/// in which case the metadata provider fills them during profile builds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchHistorySource: Send + Sync {
    /// All watch-history entries for one user
    async fn items_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchedItem>>;

    /// Per-status entry counts for one user
    async fn status_counts(&self, user_id: Uuid) -> AppResult<StatusCounts>;
}

/// Watch-history reads backed by the shared Postgres schema
pub struct PostgresWatchHistory {
    pool: PgPool,
}

impl PostgresWatchHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct WatchedItemRow {
    content_id: String,
    media_type: String,
    user_rating: Option<f64>,
    fallback_rating: f64,
    status: String,
    watch_count: i32,
    genres: Option<Vec<String>>,
}

fn parse_media_type(s: &str) -> AppResult<MediaType> {
    match s {
        "movie" => Ok(MediaType::Movie),
        "series" => Ok(MediaType::Series),
        other => Err(AppError::Internal(format!(
            "Unknown media type in watch history: {}",
            other
        ))),
    }
}

fn parse_status(s: &str) -> AppResult<WatchStatus> {
    match s {
        "want" => Ok(WatchStatus::Want),
        "watched" => Ok(WatchStatus::Watched),
        "rewatched" => Ok(WatchStatus::Rewatched),
        "dropped" => Ok(WatchStatus::Dropped),
        "in_progress" => Ok(WatchStatus::InProgress),
        other => Err(AppError::Internal(format!(
            "Unknown watch status in watch history: {}",
            other
        ))),
    }
}

impl TryFrom<WatchedItemRow> for WatchedItem {
    type Error = AppError;

    fn try_from(row: WatchedItemRow) -> AppResult<Self> {
        Ok(WatchedItem {
            media_type: parse_media_type(&row.media_type)?,
            status: parse_status(&row.status)?,
            content_id: row.content_id,
            user_rating: row.user_rating,
            fallback_rating: row.fallback_rating,
            watch_count: row.watch_count.max(0) as u32,
            genres: row.genres.unwrap_or_default(),
            cast: Vec::new(),
            crew: Vec::new(),
        })
    }
}

#[async_trait]
impl WatchHistorySource for PostgresWatchHistory {
    async fn items_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchedItem>> {
        let rows: Vec<WatchedItemRow> = sqlx::query_as(
            r#"
            SELECT content_id, media_type, user_rating, fallback_rating,
                   status, watch_count, genres
            FROM watch_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WatchedItem::try_from).collect()
    }

    async fn status_counts(&self, user_id: Uuid) -> AppResult<StatusCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM watch_history
            WHERE user_id = $1
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match parse_status(&status)? {
                WatchStatus::Want => counts.want = count,
                WatchStatus::Watched => counts.watched = count,
                WatchStatus::Rewatched => counts.rewatched = count,
                WatchStatus::Dropped => counts.dropped = count,
                WatchStatus::InProgress => counts.in_progress = count,
            }
        }

        Ok(counts)
    }
}
