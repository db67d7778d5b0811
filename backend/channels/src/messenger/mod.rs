//! Messenger channel adapter.
//!
//! Receives page webhooks, answers users through the send API and delegates
//! lookups to a `SearchBackend`.
//!
//! Routes (relative to the configured prefix):
//!   GET  /webhook — subscription verification
//!   POST /webhook — event delivery, signed with `x-hub-signature`

pub mod composer;
pub mod dispatcher;
pub mod events;
pub mod outbound;
pub mod send_api;
pub mod signature;
pub mod webhook;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{routing::get, Router};
use kunstbot_config::Settings;
use kunstbot_core::SearchBackend;
use tracing::info;

use crate::ChannelAdapter;
use composer::ReplyComposer;
use dispatcher::EventDispatcher;
use send_api::{GraphSendApi, MessageSender};
use webhook::{receive_webhook, verify_webhook, WebhookState};

pub use events::{EventKind, MessagingEvent, WebhookEnvelope};
pub use outbound::{OutboundEnvelope, SenderAction};
pub use webhook::WebhookError;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MessengerConfig {
    pub app_secret: String,
    pub validation_token: String,
    pub page_access_token: String,
    pub graph_api_url: String,
    pub reference_url: String,
    pub webhook_path: String,
    pub mock_mode: bool,
}

impl From<&Settings> for MessengerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            app_secret: settings.app_secret.clone(),
            validation_token: settings.validation_token.clone(),
            page_access_token: settings.page_access_token.clone(),
            graph_api_url: settings.graph_api_url.clone(),
            reference_url: settings.reference_url.clone(),
            webhook_path: settings.webhook_path(),
            mock_mode: settings.mock_mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

pub struct MessengerAdapter {
    config: MessengerConfig,
    sender: Arc<dyn MessageSender>,
    search: Arc<dyn SearchBackend>,
}

impl MessengerAdapter {
    /// Adapter posting to the send API (or logging, in mock mode).
    pub fn new(config: MessengerConfig, search: Arc<dyn SearchBackend>) -> Self {
        let sender = GraphSendApi::new(&config.graph_api_url, &config.page_access_token)
            .with_mock_mode(config.mock_mode);
        Self {
            config,
            sender: Arc::new(sender),
            search,
        }
    }

    /// Replace the outbound client.
    pub fn with_sender(mut self, sender: Arc<dyn MessageSender>) -> Self {
        self.sender = sender;
        self
    }

    pub fn webhook_path(&self) -> &str {
        &self.config.webhook_path
    }
}

#[async_trait]
impl ChannelAdapter for MessengerAdapter {
    fn name(&self) -> &str {
        "messenger"
    }

    fn build_router(&self) -> Router {
        let composer = ReplyComposer::new(
            Arc::clone(&self.sender),
            Arc::clone(&self.search),
            &self.config.reference_url,
        );
        let state = WebhookState {
            app_secret: self.config.app_secret.clone(),
            validation_token: self.config.validation_token.clone(),
            dispatcher: Arc::new(EventDispatcher::new(composer)),
        };
        Router::new()
            .route(
                &self.config.webhook_path,
                get(verify_webhook).post(receive_webhook),
            )
            .with_state(state)
    }

    async fn start(&self) -> Result<()> {
        info!(
            path = %self.config.webhook_path,
            search = %self.search.name(),
            mock_mode = self.config.mock_mode,
            "Messenger adapter ready (webhook-based)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{HeaderValue, Request, StatusCode};
    use kunstbot_core::{ImageResult, SearchResult};
    use kunstbot_search::{MockSearchBackend, SearchCall};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use send_api::testing::RecordingSender;
    use signature::sign;

    const SECRET: &str = "app-secret";

    fn config() -> MessengerConfig {
        MessengerConfig {
            app_secret: SECRET.into(),
            validation_token: "verify-me".into(),
            page_access_token: "page-token".into(),
            graph_api_url: "http://127.0.0.1:9".into(),
            reference_url: "https://www.rijksmuseum.nl".into(),
            webhook_path: "/bot/webhook".into(),
            mock_mode: true,
        }
    }

    fn adapter(search: MockSearchBackend) -> (Router, Arc<RecordingSender>, Arc<MockSearchBackend>) {
        let sender = Arc::new(RecordingSender::default());
        let search = Arc::new(search);
        let adapter = MessengerAdapter::new(config(), search.clone()).with_sender(sender.clone());
        (adapter.build_router(), sender, search)
    }

    fn post(body: &serde_json::Value, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::post("/bot/webhook").header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(signature::SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed(body: &serde_json::Value) -> Request<Body> {
        let signature = format!("sha1={}", sign(SECRET, body.to_string().as_bytes()));
        post(body, Some(signature))
    }

    fn message_body(text: &str) -> serde_json::Value {
        json!({
            "object": "page",
            "entry": [{
                "id": "PAGE",
                "time": 1,
                "messaging": [{
                    "sender": { "id": "u1" },
                    "recipient": { "id": "PAGE" },
                    "timestamp": 1,
                    "message": { "mid": "m1", "text": text }
                }]
            }]
        })
    }

    #[tokio::test]
    async fn verification_echoes_challenge() {
        let (router, _, _) = adapter(MockSearchBackend::new());
        let response = router
            .oneshot(
                Request::get(
                    "/bot/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"1158201444");
    }

    #[tokio::test]
    async fn verification_rejects_wrong_token() {
        let (router, _, _) = adapter(MockSearchBackend::new());
        let response = router
            .oneshot(
                Request::get("/bot/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("42"));
    }

    #[tokio::test(start_paused = true)]
    async fn signed_event_is_acknowledged_before_search_completes() {
        let search = MockSearchBackend::new().with_delay(Duration::from_secs(60));
        let (router, sender, search) = adapter(search);

        let response = router.oneshot(signed(&message_body("Utrecht"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(search.calls(), vec![SearchCall::Monuments]);
        assert_eq!(sender.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_signature_is_still_processed() {
        let (router, _, search) = adapter(MockSearchBackend::new());
        let response = router
            .oneshot(post(&message_body("1990-2000"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            search.calls(),
            vec![SearchCall::PainterByDate {
                from: "2000".into(),
                to: "1990".into()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bad_signature_rejects_without_processing() {
        let (router, sender, search) = adapter(MockSearchBackend::new());
        let body = message_body("surprise");
        let signature = format!("sha1={}", sign("wrong-secret", body.to_string().as_bytes()));
        let response = router.oneshot(post(&body, Some(signature))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(search.calls().is_empty());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn non_ascii_signature_rejects_without_processing() {
        let (router, sender, search) = adapter(MockSearchBackend::new());
        let mut request = post(&message_body("surprise"), None);
        request.headers_mut().insert(
            signature::SIGNATURE_HEADER,
            HeaderValue::from_bytes(b"sha1=\xff\xfe").unwrap(),
        );
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(search.calls().is_empty());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn non_page_object_is_not_found() {
        let (router, _, _) = adapter(MockSearchBackend::new());
        let body = json!({ "object": "user", "entry": [] });
        let response = router.oneshot(signed(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (router, _, _) = adapter(MockSearchBackend::new());
        let response = router
            .oneshot(
                Request::post("/bot/webhook")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn image_reply_end_to_end() {
        let search = MockSearchBackend::new().with_result(Ok(SearchResult::Images {
            images: ImageResult {
                id: "Q42".into(),
                image: "http://x/y.png".into(),
                label: "L".into(),
                description: "D".into(),
                ..Default::default()
            },
        }));
        let (router, sender, _) = adapter(search);
        let response = router.oneshot(signed(&message_body("vermeer"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let texts = sender.texts();
        assert_eq!(
            texts.iter().filter(|t| t.as_str() == "Je gaat zo zien: L, D").count(),
            1
        );
        assert_eq!(sender.sent().iter().filter(|e| e.image_url().is_some()).count(), 1);
        assert_eq!(
            texts.iter().filter(|t| t.contains("mensen hebben dit werk")).count(),
            1
        );
        assert!(!texts.iter().any(|t| t.contains("collectie")));
    }

    #[test]
    fn config_from_settings_uses_prefixed_path() {
        let settings = kunstbot_config::resolve(kunstbot_config::KunstbotConfig {
            app_secret: Some("s".into()),
            page_access_token: Some("t".into()),
            validation_token: Some("v".into()),
            server_url: Some("https://bot.example".into()),
            path_prefix: Some("/kunst".into()),
            ..Default::default()
        })
        .unwrap();
        let config = MessengerConfig::from(&settings);
        assert_eq!(config.webhook_path, "/kunst/webhook");
        assert_eq!(config.graph_api_url, "https://graph.facebook.com/v2.6");
    }
}
