pub mod messenger;

pub use messenger::{MessengerAdapter, MessengerConfig};

/// All channel adapters implement this trait.
#[async_trait::async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Build the Axum sub-router for the adapter's inbound webhook endpoints.
    fn build_router(&self) -> axum::Router {
        axum::Router::new()
    }

    /// Start the adapter's background work, if any.
    async fn start(&self) -> anyhow::Result<()>;
}
