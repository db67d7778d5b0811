//! Routes decoded webhook events to their handlers.

use tracing::{info, warn};

use super::composer::ReplyComposer;
use super::events::{EventKind, MessagingEvent, WebhookEnvelope};

/// The only webhook object this relay handles.
pub const PAGE_OBJECT: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported webhook object: {0}")]
pub struct UnsupportedObject(pub String);

pub struct EventDispatcher {
    composer: ReplyComposer,
}

impl EventDispatcher {
    pub fn new(composer: ReplyComposer) -> Self {
        Self { composer }
    }

    /// Dispatch every event of every entry. Returns the number of events seen.
    ///
    /// Handlers only schedule work, so this returns before any search or send completes.
    pub fn dispatch(&self, envelope: WebhookEnvelope) -> Result<usize, UnsupportedObject> {
        if envelope.object != PAGE_OBJECT {
            return Err(UnsupportedObject(envelope.object));
        }

        let mut count = 0;
        for entry in envelope.entries {
            info!(
                page_id = %entry.page_id,
                time = ?entry.time,
                events = entry.events.len(),
                "Page entry"
            );
            for event in entry.events {
                self.dispatch_event(event);
                count += 1;
            }
        }
        Ok(count)
    }

    fn dispatch_event(&self, event: MessagingEvent) {
        let MessagingEvent {
            sender_id,
            recipient_id,
            timestamp,
            kind,
        } = event;

        match kind {
            EventKind::Message(message) => {
                info!(
                    sender_id = %sender_id,
                    recipient_id = %recipient_id,
                    timestamp = ?timestamp,
                    "Received message"
                );
                self.composer.on_message(&sender_id, message);
            }
            EventKind::Postback(postback) => {
                info!(
                    sender_id = %sender_id,
                    recipient_id = %recipient_id,
                    title = ?postback.title,
                    "Received postback"
                );
                self.composer.on_postback(&sender_id, postback.payload);
            }
            EventKind::Delivery(delivery) => {
                for mid in &delivery.mids {
                    info!(message_id = %mid, "Delivery confirmed");
                }
                info!(
                    sender_id = %sender_id,
                    watermark = delivery.watermark,
                    seq = ?delivery.seq,
                    "All messages before watermark were delivered"
                );
            }
            EventKind::Read(read) => {
                info!(
                    sender_id = %sender_id,
                    watermark = read.watermark,
                    seq = ?read.seq,
                    "Messages read up to watermark"
                );
            }
            EventKind::Optin(optin) => self.composer.on_optin(&sender_id, optin),
            EventKind::AccountLink(link) => {
                info!(
                    sender_id = %sender_id,
                    status = %link.status,
                    authorization_code = ?link.authorization_code,
                    "Account link event"
                );
            }
            EventKind::Unknown => {
                warn!(sender_id = %sender_id, "Webhook received unhandled messaging event");
            }
        }
    }
}
