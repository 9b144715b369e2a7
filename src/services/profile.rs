use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        BehaviorProfile, ComputedMetrics, GenreProfile, PersonProfiles, RatingDistribution,
        StatusCounts, TasteMap, WatchedItem,
    },
    services::providers::MetadataProvider,
    services::watch_history::WatchHistorySource,
};

/// Cast entries considered per item when building the actor profile
pub const MAX_CAST_CONSIDERED: usize = 20;
/// Persons kept per credit type after ranking by weighted rating
pub const MAX_PERSONS_KEPT: usize = 50;
/// Crew job string identifying directors
pub const DIRECTOR_JOB: &str = "Director";
/// Genre score above which a genre counts toward the diversity metric
const DIVERSITY_GENRE_FLOOR: f64 = 20.0;
/// Diversity points granted per qualifying genre
const DIVERSITY_POINTS_PER_GENRE: f64 = 5.0;
/// High bucket: rating >= 8
const HIGH_RATING_MIN: f64 = 8.0;
/// Medium bucket: 5 <= rating < 8
const MEDIUM_RATING_MIN: f64 = 5.0;

/// Which credit type a person profile covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonType {
    Actor,
    Director,
}

/// Builds a user's [`TasteMap`] from watch history and content metadata
pub struct ProfileBuilder {
    history: Arc<dyn WatchHistorySource>,
    metadata: Arc<dyn MetadataProvider>,
}

impl ProfileBuilder {
    pub fn new(history: Arc<dyn WatchHistorySource>, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { history, metadata }
    }

    /// Assembles the full taste map for one user
    ///
    /// A user with zero history yields the fully-defined empty map, never an
    /// error. A failed metadata lookup drops that single item's genre and
    /// person contributions and the build continues.
    pub async fn build(&self, user_id: Uuid) -> AppResult<TasteMap> {
        let mut items = self.history.items_for_user(user_id).await?;

        if items.is_empty() {
            tracing::debug!(user_id = %user_id, "No watch history, returning empty taste map");
            return Ok(TasteMap::empty(user_id));
        }

        self.enrich_items(&mut items).await;

        let counts = self.history.status_counts(user_id).await?;

        let genres = compute_genre_profile(&items);
        let rating_distribution = compute_rating_distribution(&items);
        let metrics = compute_metrics(&genres, &rating_distribution);

        let taste_map = TasteMap {
            user_id,
            persons: PersonProfiles {
                actors: compute_person_profile(&items, PersonType::Actor),
                directors: compute_person_profile(&items, PersonType::Director),
            },
            average_rating: compute_average_rating(&items),
            behavior: compute_behavior_profile(&counts),
            item_count: items.len(),
            updated_at: Utc::now(),
            genres,
            rating_distribution,
            metrics,
        };

        tracing::info!(
            user_id = %user_id,
            items = taste_map.item_count,
            genres = taste_map.genres.len(),
            "Built taste map"
        );

        Ok(taste_map)
    }

    /// Fills genre/credit data for items that arrived with any of it missing
    ///
    /// Watch-history rows often carry genres but never credits, so an item
    /// needs a lookup whenever its genres OR its cast/crew are absent.
    /// Stored fields are kept; only the gaps are filled. Provider
    /// unavailability for one item leaves it as it arrived; the missing
    /// contribution degrades to nothing.
    async fn enrich_items(&self, items: &mut [WatchedItem]) {
        for item in items.iter_mut() {
            let missing_credits = item.cast.is_empty() && item.crew.is_empty();
            if !item.genres.is_empty() && !missing_credits {
                continue;
            }

            match self.metadata.lookup(&item.content_id, item.media_type).await {
                Ok(Some(metadata)) => {
                    if item.genres.is_empty() {
                        item.genres = metadata.genres;
                    }
                    if missing_credits {
                        item.cast = metadata.cast;
                        item.crew = metadata.crew;
                    }
                }
                Ok(None) => {
                    tracing::debug!(
                        content_id = %item.content_id,
                        provider = self.metadata.name(),
                        "No metadata for content"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        content_id = %item.content_id,
                        provider = self.metadata.name(),
                        error = %e,
                        "Metadata lookup failed, skipping item contribution"
                    );
                }
            }
        }
    }
}

/// Mean-rating accumulator keyed by name
#[derive(Default)]
struct ScoreAccumulator {
    sum: f64,
    count: u32,
}

impl ScoreAccumulator {
    fn add(&mut self, rating: f64) {
        self.sum += rating;
        self.count += 1;
    }

    /// Mean rating scaled to the 0-100 profile range
    fn score(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        ((self.sum / self.count as f64) * 10.0).round().clamp(0.0, 100.0)
    }
}

/// Per-genre preference scores over a user's items
///
/// Each item contributes its effective rating to every genre tagged on it;
/// the per-genre score is the mean rating scaled onto 0-100. Genres with no
/// items are absent, not zero.
pub fn compute_genre_profile(items: &[WatchedItem]) -> GenreProfile {
    let mut accumulators: HashMap<&str, ScoreAccumulator> = HashMap::new();

    for item in items {
        let rating = item.effective_rating();
        for genre in &item.genres {
            accumulators.entry(genre.as_str()).or_default().add(rating);
        }
    }

    accumulators
        .into_iter()
        .map(|(genre, acc)| (genre.to_string(), acc.score()))
        .collect()
}

/// Weighted-rating accumulator used to rank persons
///
/// Rewatches count more: each item's rating is weighted by max(1, watch
/// count).
#[derive(Default)]
struct WeightedAccumulator {
    plain: ScoreAccumulator,
    weighted_sum: f64,
    weight: f64,
}

impl WeightedAccumulator {
    fn add(&mut self, rating: f64, watch_count: u32) {
        let weight = watch_count.max(1) as f64;
        self.plain.add(rating);
        self.weighted_sum += rating * weight;
        self.weight += weight;
    }

    fn weighted_rating(&self) -> f64 {
        if self.weight == 0.0 {
            return 0.0;
        }
        self.weighted_sum / self.weight
    }
}

/// Per-person preference scores for one credit type
///
/// Actors come from the first [`MAX_CAST_CONSIDERED`] cast entries per item;
/// directors from crew entries with the [`DIRECTOR_JOB`] job. Scores are
/// mean ratings scaled like genres; only the top [`MAX_PERSONS_KEPT`]
/// persons by weighted rating are kept.
pub fn compute_person_profile(
    items: &[WatchedItem],
    person_type: PersonType,
) -> HashMap<String, f64> {
    let mut accumulators: HashMap<&str, WeightedAccumulator> = HashMap::new();

    for item in items {
        let rating = item.effective_rating();
        match person_type {
            PersonType::Actor => {
                for member in item.cast.iter().take(MAX_CAST_CONSIDERED) {
                    accumulators
                        .entry(member.name.as_str())
                        .or_default()
                        .add(rating, item.watch_count);
                }
            }
            PersonType::Director => {
                for member in item.crew.iter().filter(|c| c.job == DIRECTOR_JOB) {
                    accumulators
                        .entry(member.name.as_str())
                        .or_default()
                        .add(rating, item.watch_count);
                }
            }
        }
    }

    let mut ranked: Vec<(&str, &WeightedAccumulator)> = accumulators
        .iter()
        .map(|(name, acc)| (*name, acc))
        .collect();

    // Name as tie-break keeps truncation deterministic
    ranked.sort_by(|(name_a, acc_a), (name_b, acc_b)| {
        acc_b
            .weighted_rating()
            .partial_cmp(&acc_a.weighted_rating())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| name_a.cmp(name_b))
    });

    ranked
        .into_iter()
        .take(MAX_PERSONS_KEPT)
        .map(|(name, acc)| (name.to_string(), acc.plain.score()))
        .collect()
}

/// High/medium/low percentage split over items the user explicitly rated
///
/// Boundaries are exact: high >= 8, 5 <= medium < 8, low < 5. An empty
/// rated set yields all zeroes.
pub fn compute_rating_distribution(items: &[WatchedItem]) -> RatingDistribution {
    let ratings: Vec<f64> = items.iter().filter_map(|item| item.user_rating).collect();

    if ratings.is_empty() {
        return RatingDistribution::default();
    }

    let total = ratings.len() as f64;
    let high = ratings.iter().filter(|r| **r >= HIGH_RATING_MIN).count() as f64;
    let low = ratings.iter().filter(|r| **r < MEDIUM_RATING_MIN).count() as f64;
    let medium = total - high - low;

    RatingDistribution {
        high: high / total * 100.0,
        medium: medium / total * 100.0,
        low: low / total * 100.0,
    }
}

/// Mean rating across the user's items, rounded to one decimal
///
/// Uses explicit user ratings when any exist; otherwise falls back to the
/// mean of the community fallback ratings.
pub fn compute_average_rating(items: &[WatchedItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }

    let user_ratings: Vec<f64> = items.iter().filter_map(|item| item.user_rating).collect();

    let mean = if user_ratings.is_empty() {
        items.iter().map(|item| item.fallback_rating).sum::<f64>() / items.len() as f64
    } else {
        user_ratings.iter().sum::<f64>() / user_ratings.len() as f64
    };

    (mean * 10.0).round() / 10.0
}

/// Viewing-behavior rates from per-status counts
///
/// Any zero denominator yields 0 for the rewatch/drop rates and 100 for the
/// completion rate, so a user with no history gets {0, 0, 100}.
pub fn compute_behavior_profile(counts: &StatusCounts) -> BehaviorProfile {
    let rate = |numerator: i64, denominator: i64| -> Option<f64> {
        (denominator > 0).then(|| numerator as f64 / denominator as f64 * 100.0)
    };

    BehaviorProfile {
        rewatch_rate: rate(counts.rewatched, counts.watched + counts.rewatched).unwrap_or(0.0),
        drop_rate: rate(counts.dropped, counts.want + counts.dropped + counts.in_progress)
            .unwrap_or(0.0),
        completion_rate: rate(counts.watched, counts.watched + counts.in_progress).unwrap_or(100.0),
    }
}

/// Metrics derived from the genre profile and rating distribution
pub fn compute_metrics(
    genres: &GenreProfile,
    distribution: &RatingDistribution,
) -> ComputedMetrics {
    let strong_genres = genres
        .values()
        .filter(|score| **score > DIVERSITY_GENRE_FLOOR)
        .count() as f64;

    ComputedMetrics {
        positive_intensity: distribution.high,
        negative_intensity: distribution.low,
        consistency: distribution.medium,
        diversity: (strong_genres * DIVERSITY_POINTS_PER_GENRE).min(100.0),
    }
}
