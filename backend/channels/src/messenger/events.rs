//! Inbound webhook payloads.
//!
//! Decoding collapses the platform's "one optional field per event type"
//! layout into [`EventKind`], checking tags in a fixed priority order.

use serde::Deserialize;

/// Top-level webhook body. Only `object == "page"` is handled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookEnvelope {
    pub object: String,
    #[serde(rename = "entry", default)]
    pub entries: Vec<PageEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageEntry {
    #[serde(rename = "id")]
    pub page_id: String,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(rename = "messaging", default)]
    pub events: Vec<MessagingEvent>,
}

/// One messaging event addressed to the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawMessagingEvent")]
pub struct MessagingEvent {
    pub sender_id: String,
    pub recipient_id: String,
    pub timestamp: Option<i64>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Message(IncomingMessage),
    Postback(Postback),
    Delivery(Delivery),
    Read(ReadReceipt),
    Optin(Optin),
    AccountLink(AccountLink),
    /// None of the known tags was present.
    Unknown,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Message(_) => "message",
            EventKind::Postback(_) => "postback",
            EventKind::Delivery(_) => "delivery",
            EventKind::Read(_) => "read",
            EventKind::Optin(_) => "optin",
            EventKind::AccountLink(_) => "account_linking",
            EventKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub is_echo: bool,
    #[serde(rename = "mid", default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub quick_reply: Option<QuickReply>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    #[serde(default)]
    pub app_id: Option<u64>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuickReply {
    pub payload: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Postback {
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub mids: Vec<String>,
    #[serde(default)]
    pub watermark: i64,
    #[serde(default)]
    pub seq: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReadReceipt {
    #[serde(default)]
    pub watermark: i64,
    #[serde(default)]
    pub seq: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Optin {
    /// Pass-through parameter from the plugin that triggered the opt-in.
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AccountLink {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub authorization_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Party {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawMessagingEvent {
    #[serde(default)]
    sender: Party,
    #[serde(default)]
    recipient: Party,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    message: Option<IncomingMessage>,
    #[serde(default)]
    postback: Option<Postback>,
    #[serde(default)]
    delivery: Option<Delivery>,
    #[serde(default)]
    read: Option<ReadReceipt>,
    #[serde(default)]
    optin: Option<Optin>,
    #[serde(default, alias = "accountLink")]
    account_linking: Option<AccountLink>,
}

impl From<RawMessagingEvent> for MessagingEvent {
    fn from(raw: RawMessagingEvent) -> Self {
        // First present tag wins.
        let kind = if let Some(message) = raw.message {
            EventKind::Message(message)
        } else if let Some(postback) = raw.postback {
            EventKind::Postback(postback)
        } else if let Some(delivery) = raw.delivery {
            EventKind::Delivery(delivery)
        } else if let Some(read) = raw.read {
            EventKind::Read(read)
        } else if let Some(optin) = raw.optin {
            EventKind::Optin(optin)
        } else if let Some(link) = raw.account_linking {
            EventKind::AccountLink(link)
        } else {
            EventKind::Unknown
        };

        Self {
            sender_id: raw.sender.id,
            recipient_id: raw.recipient.id,
            timestamp: raw.timestamp,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(event: serde_json::Value) -> MessagingEvent {
        serde_json::from_value(event).unwrap()
    }

    #[test]
    fn decodes_full_envelope() {
        let body = json!({
            "object": "page",
            "entry": [{
                "id": "PAGE_ID",
                "time": 1458692752478i64,
                "messaging": [{
                    "sender": { "id": "USER_ID" },
                    "recipient": { "id": "PAGE_ID" },
                    "timestamp": 1458692752478i64,
                    "message": {
                        "mid": "mid.1457764197618:41d102a3e1ae206a38",
                        "text": "hello, world!",
                        "quick_reply": { "payload": "DEVELOPER_DEFINED_PAYLOAD" }
                    }
                }]
            }]
        });
        let envelope: WebhookEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.object, "page");
        assert_eq!(envelope.entries[0].page_id, "PAGE_ID");

        let event = &envelope.entries[0].events[0];
        assert_eq!(event.sender_id, "USER_ID");
        let EventKind::Message(message) = &event.kind else {
            panic!("expected message event");
        };
        assert!(!message.is_echo);
        assert_eq!(message.text.as_deref(), Some("hello, world!"));
        assert_eq!(
            message.quick_reply.as_ref().map(|q| q.payload.as_str()),
            Some("DEVELOPER_DEFINED_PAYLOAD")
        );
    }

    #[test]
    fn message_wins_over_postback() {
        let event = decode(json!({
            "sender": { "id": "u" },
            "recipient": { "id": "p" },
            "postback": { "payload": "Q5598" },
            "message": { "mid": "m1", "text": "hoi" }
        }));
        assert_eq!(event.kind.name(), "message");
    }

    #[test]
    fn decodes_each_remaining_tag() {
        let cases = [
            (json!({ "postback": { "payload": "Q1", "title": "Rembrandt" } }), "postback"),
            (json!({ "delivery": { "mids": ["m1"], "watermark": 10, "seq": 3 } }), "delivery"),
            (json!({ "read": { "watermark": 10 } }), "read"),
            (json!({ "optin": { "ref": "PASS_THROUGH" } }), "optin"),
            (json!({ "account_linking": { "status": "linked", "authorization_code": "c" } }), "account_linking"),
            (json!({ "accountLink": { "status": "unlinked" } }), "account_linking"),
            (json!({ "reaction": { "emoji": "x" } }), "unknown"),
        ];
        for (value, expected) in cases {
            assert_eq!(decode(value).kind.name(), expected);
        }
    }

    #[test]
    fn optin_reference_is_kept() {
        let event = decode(json!({ "sender": { "id": "u" }, "optin": { "ref": "PASS" } }));
        assert_eq!(
            event.kind,
            EventKind::Optin(Optin {
                reference: Some("PASS".into())
            })
        );
    }

    #[test]
    fn echo_flag_and_metadata() {
        let event = decode(json!({
            "message": { "is_echo": true, "app_id": 1517776481860111u64, "metadata": "DEV", "mid": "m" }
        }));
        let EventKind::Message(message) = event.kind else {
            panic!("expected message event");
        };
        assert!(message.is_echo);
        assert_eq!(message.app_id, Some(1517776481860111));
        assert_eq!(message.metadata.as_deref(), Some("DEV"));
    }
}
