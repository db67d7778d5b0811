//! Outbound client for the platform's send API.
//!
//! Sends are fire-and-forget: failures are logged together with the payload
//! and never reach the caller.

use async_trait::async_trait;
use kunstbot_core::KunstbotError;
use logging::redact_sensitive_data;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{error, info};

use super::outbound::OutboundEnvelope;

/// Anything that can push an envelope to a user.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver one envelope. Never fails from the caller's point of view.
    async fn send(&self, envelope: OutboundEnvelope);
}

/// Successful send API answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Client for `POST {graph_api_url}/me/messages`.
pub struct GraphSendApi {
    client: Client,
    graph_api_url: String,
    page_access_token: String,
    mock_mode: bool,
}

impl GraphSendApi {
    pub fn new(graph_api_url: impl Into<String>, page_access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            graph_api_url: graph_api_url.into(),
            page_access_token: page_access_token.into(),
            mock_mode: false,
        }
    }

    /// Log payloads instead of posting them.
    pub fn with_mock_mode(mut self, mock_mode: bool) -> Self {
        self.mock_mode = mock_mode;
        self
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    fn endpoint(&self) -> String {
        format!("{}/me/messages", self.graph_api_url.trim_end_matches('/'))
    }

    /// Post one envelope and return the platform's answer.
    pub async fn deliver(&self, envelope: &OutboundEnvelope) -> Result<SendResponse, KunstbotError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("access_token", self.page_access_token.as_str())])
            .json(envelope)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!(redact_sensitive_data(&e.to_string())))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(KunstbotError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // The ids are informational; an odd body still counts as delivered.
        Ok(response.json().await.unwrap_or_default())
    }
}

#[async_trait]
impl MessageSender for GraphSendApi {
    async fn send(&self, envelope: OutboundEnvelope) {
        let payload = serde_json::to_string(&envelope).unwrap_or_default();

        if self.mock_mode {
            info!(
                recipient_id = %envelope.recipient.id,
                payload = %payload,
                "Mock mode: not calling the send API"
            );
            return;
        }

        match self.deliver(&envelope).await {
            Ok(SendResponse {
                recipient_id,
                message_id: Some(message_id),
            }) => {
                info!(
                    message_id = %message_id,
                    recipient_id = %recipient_id.unwrap_or_default(),
                    "Sent message"
                );
            }
            Ok(SendResponse { recipient_id, .. }) => {
                info!(
                    recipient_id = %recipient_id.unwrap_or_default(),
                    "Called send API"
                );
            }
            Err(e) => {
                error!(
                    error = %redact_sensitive_data(&e.to_string()),
                    payload = %payload,
                    "Failed calling send API"
                );
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::outbound::SenderAction;
    use serde_json::json;
    use tracing_test::traced_test;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_envelope_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/me/messages"))
            .and(query_param("access_token", "page-token"))
            .and(body_json(json!({
                "recipient": { "id": "42" },
                "message": { "text": "hallo" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "recipient_id": "42",
                "message_id": "mid.1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = GraphSendApi::new(server.uri(), "page-token");
        let response = api
            .deliver(&OutboundEnvelope::text("42", "hallo"))
            .await
            .unwrap();
        assert_eq!(response.message_id.as_deref(), Some("mid.1"));
        assert_eq!(response.recipient_id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn non_ok_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/me/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid OAuth access token." }
            })))
            .mount(&server)
            .await;

        let api = GraphSendApi::new(server.uri(), "bad");
        let err = api
            .deliver(&OutboundEnvelope::action("42", SenderAction::TypingOn))
            .await
            .unwrap_err();
        assert!(matches!(err, KunstbotError::Http { status: 400, ref body } if body.contains("OAuth")));
    }

    #[tokio::test]
    async fn send_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let api = GraphSendApi::new(server.uri(), "token");
        api.send(OutboundEnvelope::text("42", "hallo")).await;
    }

    #[tokio::test]
    #[traced_test]
    async fn mock_mode_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = GraphSendApi::new(server.uri(), "token").with_mock_mode(true);
        assert!(api.is_mock());
        api.send(OutboundEnvelope::text("42", "kunst in mock mode")).await;

        assert!(logs_contain("Mock mode: not calling the send API"));
        assert!(logs_contain(r#"{"recipient":{"id":"42"},"message":{"text":"kunst in mock mode"}}"#));
    }

    #[tokio::test]
    async fn transport_error_is_swallowed() {
        let api = GraphSendApi::new("http://127.0.0.1:9", "token");
        api.send(OutboundEnvelope::text("42", "hallo")).await;
    }
}
