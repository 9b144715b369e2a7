use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{BatchProgress, BatchSummary, CanonicalPair, ComputeSource, PairError},
    services::candidates::{Candidate, CandidateSelector},
    services::scores::PairScorer,
};

/// Completed items required before a user joins a batch run
pub const MIN_WATCH_COUNT: i64 = 5;
/// Trailing activity window, in days, for the active-user filter
pub const ACTIVITY_WINDOW_DAYS: i64 = 30;
/// Candidates compared per user; the bound that keeps the run near-linear
pub const CANDIDATE_LIMIT: i64 = 20;
/// Per-pair failures kept verbatim in the run summary
pub const MAX_ERROR_SAMPLES: usize = 10;
/// Users between progress callbacks
const PROGRESS_INTERVAL: usize = 10;

/// Progress callback invoked periodically during a batch run
pub type ProgressFn = Box<dyn Fn(&BatchProgress) + Send + Sync>;

/// Orchestrates population-wide similarity recomputation
///
/// Pages through active users, compares each against its bounded candidate
/// set, and records every pair through the scorer's idempotent upsert. A
/// crash mid-run loses no committed progress; callers resume by advancing
/// the `(limit, offset)` page.
pub struct BatchScheduler {
    candidates: Arc<dyn CandidateSelector>,
    scorer: Arc<dyn PairScorer>,
    concurrency: usize,
}

#[derive(Default)]
struct RunCounters {
    users_processed: usize,
    pairs_computed: usize,
    errors: usize,
    error_samples: Vec<PairError>,
}

impl RunCounters {
    fn record_error(&mut self, user_a: Uuid, user_b: Option<Uuid>, message: String) {
        self.errors += 1;
        if self.error_samples.len() < MAX_ERROR_SAMPLES {
            self.error_samples.push(PairError {
                user_a,
                user_b,
                message,
            });
        }
    }

    fn progress(&self) -> BatchProgress {
        BatchProgress {
            users_processed: self.users_processed,
            pairs_computed: self.pairs_computed,
            errors: self.errors,
        }
    }
}

impl BatchScheduler {
    pub fn new(
        candidates: Arc<dyn CandidateSelector>,
        scorer: Arc<dyn PairScorer>,
        concurrency: usize,
    ) -> Self {
        Self {
            candidates,
            scorer,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs one page of the population-wide computation
    ///
    /// Per-user and per-pair failures are counted and sampled but never
    /// abort the run; only a failure to fetch the active-user page itself
    /// propagates.
    pub async fn run(
        &self,
        limit: i64,
        offset: i64,
        on_progress: Option<ProgressFn>,
    ) -> AppResult<BatchSummary> {
        let start = Instant::now();

        let users = self
            .candidates
            .active_users(MIN_WATCH_COUNT, ACTIVITY_WINDOW_DAYS, limit, offset)
            .await?;

        tracing::info!(
            users = users.len(),
            limit,
            offset,
            "Starting batch similarity run"
        );

        let mut counters = RunCounters::default();
        // Both sides of a pair can appear in the same page; skip the repeat
        let mut seen_pairs: HashSet<CanonicalPair> = HashSet::new();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        for user in users {
            match self.candidates.candidates_for(user, CANDIDATE_LIMIT).await {
                Ok(candidates) => {
                    self.score_candidates(user, candidates, &semaphore, &mut seen_pairs, &mut counters)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "Candidate lookup failed");
                    counters.record_error(user, None, format!("candidate lookup failed: {}", e));
                }
            }

            counters.users_processed += 1;

            if counters.users_processed % PROGRESS_INTERVAL == 0 {
                if let Some(callback) = on_progress.as_ref() {
                    callback(&counters.progress());
                }
            }
        }

        if let Some(callback) = on_progress.as_ref() {
            callback(&counters.progress());
        }

        let duration = start.elapsed();
        let pairs_per_second = if duration.as_secs_f64() > 0.0 {
            counters.pairs_computed as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        let summary = BatchSummary {
            users_processed: counters.users_processed,
            pairs_computed: counters.pairs_computed,
            errors: counters.errors,
            error_samples: counters.error_samples,
            duration_ms: duration.as_millis(),
            pairs_per_second,
        };

        tracing::info!(
            users = summary.users_processed,
            pairs = summary.pairs_computed,
            errors = summary.errors,
            duration_ms = summary.duration_ms,
            "Batch similarity run finished"
        );

        Ok(summary)
    }

    /// Scores one user's candidate pairs with bounded parallelism
    async fn score_candidates(
        &self,
        user: Uuid,
        candidates: Vec<Candidate>,
        semaphore: &Arc<Semaphore>,
        seen_pairs: &mut HashSet<CanonicalPair>,
        counters: &mut RunCounters,
    ) {
        let mut tasks = Vec::new();

        for candidate in candidates {
            let pair = CanonicalPair::new(user, candidate.user_id);
            if !seen_pairs.insert(pair) {
                continue;
            }

            let scorer = Arc::clone(&self.scorer);
            let permit_source = Arc::clone(semaphore);
            let task = tokio::spawn(async move {
                // Closed-semaphore errors cannot happen; the semaphore lives
                // for the whole run
                let _permit = permit_source.acquire_owned().await;
                let outcome = scorer
                    .compute_and_store(pair.a, pair.b, ComputeSource::Scheduler)
                    .await;
                (pair, outcome)
            });
            tasks.push(task);
        }

        for task in tasks {
            match task.await {
                Ok((_, Ok(_))) => counters.pairs_computed += 1,
                Ok((pair, Err(e))) => {
                    tracing::warn!(
                        user_a = %pair.a,
                        user_b = %pair.b,
                        error = %e,
                        "Pair similarity computation failed"
                    );
                    counters.record_error(pair.a, Some(pair.b), e.to_string());
                }
                Err(e) => {
                    counters.record_error(user, None, format!("task join error: {}", e));
                }
            }
        }
    }
}
