//! Outbound message envelopes in the shape the send API expects.

use serde::Serialize;

/// At most this many buttons fit in a button template.
pub const MAX_TEMPLATE_BUTTONS: usize = 3;

/// One request body for `POST /me/messages`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEnvelope {
    pub recipient: Recipient,
    #[serde(flatten)]
    pub body: OutboundBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipient {
    pub id: String,
}

/// Either a message or a sender action, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundBody {
    Message { message: OutboundMessage },
    Action { sender_action: SenderAction },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Text { text: String },
    Attachment { attachment: Attachment },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Image { payload: UrlPayload },
    Template { payload: TemplatePayload },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlPayload {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "template_type", rename_all = "snake_case")]
pub enum TemplatePayload {
    Button {
        text: String,
        buttons: Vec<TemplateButton>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateButton {
    Postback { title: String, payload: String },
    WebUrl { url: String, title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
}

impl OutboundEnvelope {
    fn message(recipient_id: &str, message: OutboundMessage) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            body: OutboundBody::Message { message },
        }
    }

    pub fn text(recipient_id: &str, text: impl Into<String>) -> Self {
        Self::message(recipient_id, OutboundMessage::Text { text: text.into() })
    }

    pub fn image(recipient_id: &str, url: impl Into<String>) -> Self {
        Self::message(
            recipient_id,
            OutboundMessage::Attachment {
                attachment: Attachment::Image {
                    payload: UrlPayload { url: url.into() },
                },
            },
        )
    }

    /// Button template with postback buttons. Buttons past the template limit are dropped.
    pub fn buttons(
        recipient_id: &str,
        text: impl Into<String>,
        buttons: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let buttons = buttons
            .into_iter()
            .take(MAX_TEMPLATE_BUTTONS)
            .map(|(title, payload)| TemplateButton::Postback { title, payload })
            .collect();
        Self::template(recipient_id, text.into(), buttons)
    }

    /// Button template with a single web link.
    pub fn link(
        recipient_id: &str,
        text: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let button = TemplateButton::WebUrl {
            url: url.into(),
            title: title.into(),
        };
        Self::template(recipient_id, text.into(), vec![button])
    }

    pub fn action(recipient_id: &str, action: SenderAction) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            body: OutboundBody::Action {
                sender_action: action,
            },
        }
    }

    fn template(recipient_id: &str, text: String, buttons: Vec<TemplateButton>) -> Self {
        Self::message(
            recipient_id,
            OutboundMessage::Attachment {
                attachment: Attachment::Template {
                    payload: TemplatePayload::Button { text, buttons },
                },
            },
        )
    }

    /// Text of a plain text message.
    pub fn text_content(&self) -> Option<&str> {
        match &self.body {
            OutboundBody::Message {
                message: OutboundMessage::Text { text },
            } => Some(text),
            _ => None,
        }
    }

    pub fn sender_action(&self) -> Option<SenderAction> {
        match &self.body {
            OutboundBody::Action { sender_action } => Some(*sender_action),
            _ => None,
        }
    }

    /// Buttons of a button template, empty for anything else.
    pub fn template_buttons(&self) -> &[TemplateButton] {
        match &self.body {
            OutboundBody::Message {
                message:
                    OutboundMessage::Attachment {
                        attachment: Attachment::Template {
                            payload: TemplatePayload::Button { buttons, .. },
                        },
                    },
            } => buttons,
            _ => &[],
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match &self.body {
            OutboundBody::Message {
                message:
                    OutboundMessage::Attachment {
                        attachment: Attachment::Image { payload },
                    },
            } => Some(&payload.url),
            _ => None,
        }
    }
}
