//! Structured logging for kunstbot.
//!
//! Console output plus an optional rolling NDJSON file, and scrubbing of
//! credentials from strings that end up in log lines.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
