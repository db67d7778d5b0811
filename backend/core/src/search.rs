use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result produced by a search collaborator.
///
/// The `type` tag on the wire selects the variant:
/// `{"type":"buttons",...}`, `{"type":"images","images":{...}}` or
/// `{"type":"text","text":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchResult {
    /// Several candidates; the user picks one via a postback button.
    Buttons(ButtonsResult),
    /// A single artwork to show.
    Images { images: ImageResult },
    /// Plain answer, sent verbatim.
    Text { text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonsResult {
    /// Prompt shown above the buttons. Falls back to a fixed prompt when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub buttons: Vec<SearchButton>,
}

/// One selectable candidate. `payload` comes back as a postback when tapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchButton {
    pub title: String,
    pub payload: String,
}

/// An artwork as returned by the search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    pub id: String,
    /// Direct URL of the image file.
    pub image: String,
    pub label: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Page describing the artwork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Artist identifier, usable as a `paintings_by_artist` argument.
    #[serde(default, alias = "artist", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Failure reported by a search collaborator. The display text is shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The backend answered with an error message.
    #[error("{0}")]
    Backend(String),

    #[error("De zoekdienst is niet bereikbaar: {0}")]
    Unavailable(String),

    #[error("Onverwacht antwoord van de zoekdienst: {0}")]
    Decode(String),
}

/// The external search collaborator.
///
/// Every call completes exactly once with either a result or an error.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Free-text painter search.
    async fn search_painters(&self, query: &str) -> Result<SearchResult, SearchError>;

    /// Painters active between two dates.
    async fn painter_by_date(&self, from: &str, to: &str) -> Result<SearchResult, SearchError>;

    /// Monuments in Utrecht.
    async fn get_monuments(&self) -> Result<SearchResult, SearchError>;

    /// A random artist.
    async fn random_artist(&self) -> Result<SearchResult, SearchError>;

    /// A painting by the given artist.
    async fn paintings_by_artist(&self, artist_id: &str) -> Result<SearchResult, SearchError>;
}
