/// TMDB metadata provider
///
/// Fetches genres and credits in one call via `append_to_response=credits`
/// and caches the parsed result in Redis so repeated profile builds across
/// the population do not hammer the API. The old process-wide credits map
/// is gone; the injected cache bounds growth via TTL eviction.
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CastMember, ContentMetadata, CrewMember, MediaType},
    services::providers::MetadataProvider,
};

const METADATA_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCastEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewEntry {
    name: String,
    job: String,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastEntry>,
    #[serde(default)]
    crew: Vec<TmdbCrewEntry>,
}

#[derive(Debug, Deserialize)]
struct TmdbDetails {
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    credits: TmdbCredits,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// TMDB path segment for a media type ("tv", not "series")
    fn path_segment(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Movie => "movie",
            MediaType::Series => "tv",
        }
    }

    fn convert_details(details: TmdbDetails) -> ContentMetadata {
        ContentMetadata {
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            cast: details
                .credits
                .cast
                .into_iter()
                .map(|c| CastMember { name: c.name })
                .collect(),
            crew: details
                .credits
                .crew
                .into_iter()
                .map(|c| CrewMember {
                    name: c.name,
                    job: c.job,
                })
                .collect(),
        }
    }

    async fn call_api(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<ContentMetadata>> {
        let url = format!(
            "{}/{}/{}",
            self.api_url,
            Self::path_segment(media_type),
            content_id
        );

        tracing::debug!(content_id = %content_id, "Fetching metadata from TMDB");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", "credits"),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(content_id = %content_id, "TMDB has no record for content");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let details: TmdbDetails = response.json().await?;
        Ok(Some(Self::convert_details(details)))
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    async fn lookup(
        &self,
        content_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<ContentMetadata>> {
        let key = CacheKey::ContentMetadata(format!("{}:{}", media_type.as_str(), content_id));

        if let Some(cached) = self.cache.get_or_miss::<ContentMetadata>(&key).await {
            tracing::debug!(content_id = %content_id, "Metadata cache hit");
            return Ok(Some(cached));
        }

        let metadata = self.call_api(content_id, media_type).await?;

        if let Some(ref found) = metadata {
            self.cache.set_in_background(&key, found, METADATA_CACHE_TTL);
        }

        Ok(metadata)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_for_series_is_tv() {
        assert_eq!(TmdbProvider::path_segment(MediaType::Movie), "movie");
        assert_eq!(TmdbProvider::path_segment(MediaType::Series), "tv");
    }

    #[test]
    fn test_convert_details_maps_credits() {
        let details = TmdbDetails {
            genres: vec![
                TmdbGenre {
                    name: "Action".to_string(),
                },
                TmdbGenre {
                    name: "Comedy".to_string(),
                },
            ],
            credits: TmdbCredits {
                cast: vec![TmdbCastEntry {
                    name: "Lead Actor".to_string(),
                }],
                crew: vec![
                    TmdbCrewEntry {
                        name: "The Director".to_string(),
                        job: "Director".to_string(),
                    },
                    TmdbCrewEntry {
                        name: "The Editor".to_string(),
                        job: "Editor".to_string(),
                    },
                ],
            },
        };

        let metadata = TmdbProvider::convert_details(details);

        assert_eq!(metadata.genres, vec!["Action", "Comedy"]);
        assert_eq!(metadata.cast.len(), 1);
        assert_eq!(metadata.crew.len(), 2);
        assert_eq!(metadata.crew[0].job, "Director");
    }

    #[test]
    fn test_parse_details_with_missing_credits() {
        // TMDB omits the credits block for some titles
        let details: TmdbDetails =
            serde_json::from_str(r#"{"genres": [{"id": 28, "name": "Action"}]}"#).unwrap();

        let metadata = TmdbProvider::convert_details(details);
        assert_eq!(metadata.genres, vec!["Action"]);
        assert!(metadata.cast.is_empty());
        assert!(metadata.crew.is_empty());
    }
}
