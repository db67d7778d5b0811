pub mod error;
pub mod search;

pub use error::KunstbotError;
pub use search::{
    ButtonsResult, ImageResult, SearchBackend, SearchButton, SearchError, SearchResult,
};
