//! Movie metadata service client
//!
//! `MetadataSource` is the seam between reconciliation and the network: the
//! reconciler only sees fetch-by-identifier and search-by-title. `TmdbClient`
//! implements it against a TMDB-compatible HTTP API.

use async_trait::async_trait;
use frame_common::config::{ApiConfig, Credentials};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("frame-verify/", env!("CARGO_PKG_VERSION"));

/// Metadata lookup errors
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Movie not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl LookupError {
    /// Whether the failure points at the service rather than at the record
    ///
    /// Transport errors, 429 and 5xx responses are transient. A 404 means the
    /// identifier is wrong, which is exactly what reconciliation repairs.
    pub fn is_transient(&self) -> bool {
        match self {
            LookupError::Network(_) | LookupError::RateLimited => true,
            LookupError::Api(status, _) => *status >= 500,
            LookupError::NotFound(_) | LookupError::Parse(_) => false,
        }
    }
}

/// Result of fetch-by-identifier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MovieDetails {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub title: String,
    /// Release date in YYYY-MM-DD format
    #[serde(default)]
    pub release_date: Option<String>,
}

/// One entry of a relevance-ranked search response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl SearchHit {
    /// Release year, when the release date parses
    pub fn release_year(&self) -> Option<i32> {
        release_year(self.release_date.as_deref())
    }
}

/// Year part of a `YYYY-MM-DD` release date (empty strings are common in search results)
pub fn release_year(release_date: Option<&str>) -> Option<i32> {
    use chrono::Datelike;

    let date = release_date?.trim();
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Identifiers arrive as JSON numbers from TMDB; accept strings too
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Read-only movie metadata lookups
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Look up a movie by identifier
    async fn fetch_by_id(&self, id: &str) -> Result<MovieDetails, LookupError>;

    /// Search by title, optionally narrowed to a release year; results are relevance-ranked
    async fn search(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchHit>, LookupError>;
}

/// TMDB API client
pub struct TmdbClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    language: Option<String>,
}

impl TmdbClient {
    pub fn new(api_config: &ApiConfig, credentials: Credentials) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .connect_timeout(Duration::from_secs(api_config.connect_timeout_secs))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: api_config.base_url.trim_end_matches('/').to_string(),
            credentials,
            language: api_config.language.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.http_client.get(url);

        let request = match &self.credentials {
            Credentials::ApiKey(key) => request.query(&[("api_key", key.as_str())]),
            Credentials::AccessToken(token) => request.bearer_auth(token),
        };

        match &self.language {
            Some(language) => request.query(&[("language", language.as_str())]),
            None => request,
        }
    }

    async fn send(
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, LookupError> {
        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(what.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LookupError::Api(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn fetch_by_id(&self, id: &str) -> Result<MovieDetails, LookupError> {
        tracing::debug!(id = %id, "Fetching movie by id");

        let request = self.get(&format!("/movie/{}", id));
        let response = Self::send(request, id).await?;

        let details: MovieDetails = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        tracing::debug!(id = %id, title = %details.title, "Retrieved movie");
        Ok(details)
    }

    async fn search(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchHit>, LookupError> {
        tracing::debug!(title = %title, year = ?year, "Searching movies");

        let mut request = self.get("/search/movie").query(&[("query", title)]);
        if let Some(year) = year {
            request = request.query(&[("year", year)]);
        }

        let response = Self::send(request, title).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        tracing::debug!(title = %title, hits = body.results.len(), "Search complete");
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = TmdbClient::new(
            &ApiConfig::default(),
            Credentials::ApiKey("test".to_string()),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_numeric_and_string_ids_decode() {
        let numeric: MovieDetails =
            serde_json::from_str(r#"{"id": 28, "title": "Wings", "release_date": "1927-08-12"}"#)
                .unwrap();
        assert_eq!(numeric.id, "28");

        let text: SearchHit =
            serde_json::from_str(r#"{"id": "42", "title": "The Artist"}"#).unwrap();
        assert_eq!(text.id, "42");
        assert_eq!(text.release_date, None);
    }

    #[test]
    fn test_only_service_failures_are_transient() {
        assert!(LookupError::Network("reset".to_string()).is_transient());
        assert!(LookupError::RateLimited.is_transient());
        assert!(LookupError::Api(503, String::new()).is_transient());
        assert!(!LookupError::Api(401, String::new()).is_transient());
        assert!(!LookupError::NotFound("28".to_string()).is_transient());
        assert!(!LookupError::Parse("eof".to_string()).is_transient());
    }

    #[test]
    fn test_release_year_parsing() {
        assert_eq!(release_year(Some("2011-11-23")), Some(2011));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(Some("2011")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn test_search_response_tolerates_missing_results() {
        let body: SearchResponse = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(body.results.is_empty());
    }
}
