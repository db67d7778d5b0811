use thiserror::Error;

/// Top-level error type for the kunstbot relay.
#[derive(Debug, Error)]
pub enum KunstbotError {
    #[error("webhook signature does not match the request body")]
    SignatureMismatch,

    #[error("malformed webhook signature header: {0}")]
    MalformedSignature(String),

    #[error("send API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
