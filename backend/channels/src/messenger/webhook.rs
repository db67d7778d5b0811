//! Webhook endpoints: subscription verification (GET) and event delivery (POST).

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use kunstbot_core::KunstbotError;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::dispatcher::{EventDispatcher, UnsupportedObject};
use super::events::WebhookEnvelope;
use super::signature::{verify_signature, SIGNATURE_HEADER};

#[derive(Clone)]
pub(crate) struct WebhookState {
    pub(crate) app_secret: String,
    pub(crate) validation_token: String,
    pub(crate) dispatcher: Arc<EventDispatcher>,
}

/// Subscription verification query.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook verification failed")]
    VerificationFailed,

    #[error(transparent)]
    Signature(#[from] KunstbotError),

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error(transparent)]
    UnsupportedObject(#[from] UnsupportedObject),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::VerificationFailed | WebhookError::Signature(_) => StatusCode::FORBIDDEN,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::UnsupportedObject(_) => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

/// Echo `hub.challenge` when `hub.verify_token` matches the configured token.
pub(crate) async fn verify_webhook(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyRequest>,
) -> Result<String, WebhookError> {
    match (params.verify_token, params.challenge) {
        (Some(token), Some(challenge)) if token == state.validation_token => {
            info!(mode = ?params.mode, "Validating webhook");
            Ok(challenge)
        }
        _ => {
            error!("Failed validation. Make sure the validation tokens match.");
            Err(WebhookError::VerificationFailed)
        }
    }
}

/// Verify, decode and dispatch a batch of events, then acknowledge.
///
/// The acknowledgement does not wait for any search or send triggered by the events.
pub(crate) async fn receive_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    match headers.get(SIGNATURE_HEADER) {
        Some(value) => {
            let checked = match value.to_str() {
                Ok(signature) => verify_signature(&state.app_secret, &body, signature),
                Err(_) => Err(KunstbotError::MalformedSignature(
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )),
            };
            if let Err(e) = checked {
                error!(error = %e, "Couldn't validate the request signature; rejecting webhook");
                return Err(e.into());
            }
        }
        None => warn!("Couldn't validate the signature: {SIGNATURE_HEADER} header missing"),
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "Failed to parse webhook payload");
        WebhookError::from(e)
    })?;

    match state.dispatcher.dispatch(envelope) {
        Ok(count) => {
            info!(events = count, "Webhook processed");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            warn!(error = %e, "Ignoring webhook");
            Err(e.into())
        }
    }
}
