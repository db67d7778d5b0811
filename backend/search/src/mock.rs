use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kunstbot_core::{SearchBackend, SearchError, SearchResult};

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCall {
    SearchPainters(String),
    PainterByDate { from: String, to: String },
    Monuments,
    RandomArtist,
    PaintingsByArtist(String),
}

impl SearchCall {
    fn operation(&self) -> &'static str {
        match self {
            SearchCall::SearchPainters(_) => "search_painters",
            SearchCall::PainterByDate { .. } => "painter_by_date",
            SearchCall::Monuments => "get_monuments",
            SearchCall::RandomArtist => "random_artist",
            SearchCall::PaintingsByArtist(_) => "paintings_by_artist",
        }
    }
}

/// A search collaborator that returns scripted results and records its calls.
pub struct MockSearchBackend {
    fallback: Result<SearchResult, SearchError>,
    scripted: HashMap<&'static str, Result<SearchResult, SearchError>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<SearchCall>>,
}

impl MockSearchBackend {
    pub fn new() -> Self {
        Self {
            fallback: Ok(SearchResult::Text {
                text: "Mock result".to_string(),
            }),
            scripted: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Result for every operation without a scripted one.
    pub fn with_result(mut self, result: Result<SearchResult, SearchError>) -> Self {
        self.fallback = result;
        self
    }

    /// Result for one operation, named after the trait method (e.g. `"get_monuments"`).
    pub fn with_result_for(
        mut self,
        operation: &'static str,
        result: Result<SearchResult, SearchError>,
    ) -> Self {
        self.scripted.insert(operation, result);
        self
    }

    /// Delay every answer, to observe behaviour while a search is pending.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn answer(&self, call: SearchCall) -> Result<SearchResult, SearchError> {
        let operation = call.operation();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.scripted
            .get(operation)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for MockSearchBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_painters(&self, query: &str) -> Result<SearchResult, SearchError> {
        self.answer(SearchCall::SearchPainters(query.to_string()))
            .await
    }

    async fn painter_by_date(&self, from: &str, to: &str) -> Result<SearchResult, SearchError> {
        self.answer(SearchCall::PainterByDate {
            from: from.to_string(),
            to: to.to_string(),
        })
        .await
    }

    async fn get_monuments(&self) -> Result<SearchResult, SearchError> {
        self.answer(SearchCall::Monuments).await
    }

    async fn random_artist(&self) -> Result<SearchResult, SearchError> {
        self.answer(SearchCall::RandomArtist).await
    }

    async fn paintings_by_artist(&self, artist_id: &str) -> Result<SearchResult, SearchError> {
        self.answer(SearchCall::PaintingsByArtist(artist_id.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_result_overrides_fallback() {
        let mock = MockSearchBackend::new().with_result_for(
            "get_monuments",
            Err(SearchError::Backend("geen monumenten".into())),
        );

        assert!(mock.get_monuments().await.is_err());
        assert!(mock.random_artist().await.is_ok());
        assert_eq!(mock.calls(), vec![SearchCall::Monuments, SearchCall::RandomArtist]);
    }
}
