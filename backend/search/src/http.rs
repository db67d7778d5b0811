use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use kunstbot_core::{SearchBackend, SearchError, SearchResult};

/// Search collaborator reached over HTTP.
///
/// Every endpoint answers with a `SearchResult` JSON body, or `{"error": "..."}`.
pub struct HttpSearchBackend {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpSearchBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| SearchError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Unavailable(e.to_string()))?;

        debug!(
            url = %url,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Search service responded"
        );

        if let Ok(ErrorBody { error }) = serde_json::from_str::<ErrorBody>(&body) {
            return Err(SearchError::Backend(error));
        }
        if !status.is_success() {
            return Err(SearchError::Backend(format!(
                "Zoeken is mislukt (status {})",
                status.as_u16()
            )));
        }

        serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn search_painters(&self, query: &str) -> Result<SearchResult, SearchError> {
        self.fetch("/painters", &[("q", query)]).await
    }

    async fn painter_by_date(&self, from: &str, to: &str) -> Result<SearchResult, SearchError> {
        self.fetch("/painters/by-date", &[("from", from), ("to", to)])
            .await
    }

    async fn get_monuments(&self) -> Result<SearchResult, SearchError> {
        self.fetch("/monuments", &[]).await
    }

    async fn random_artist(&self) -> Result<SearchResult, SearchError> {
        self.fetch("/artists/random", &[]).await
    }

    async fn paintings_by_artist(&self, artist_id: &str) -> Result<SearchResult, SearchError> {
        let path = format!("/artists/{}/paintings", urlencoding::encode(artist_id));
        self.fetch(&path, &[]).await
    }
}
