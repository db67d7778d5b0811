//! Concrete implementations of the `SearchBackend` contract.

pub mod http;
pub mod mock;

pub use http::HttpSearchBackend;
pub use mock::{MockSearchBackend, SearchCall};
