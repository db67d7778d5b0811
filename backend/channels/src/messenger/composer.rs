//! Reply composer: turns user input into searches and search results into messages.
//!
//! Every entry point returns immediately. Work continues in spawned tasks, and
//! follow-up messages are scheduled as detached timers that are never cancelled.

use std::sync::Arc;
use std::time::Duration;

use kunstbot_core::{ButtonsResult, ImageResult, SearchBackend, SearchError, SearchResult};
use rand::Rng;
use tracing::{debug, info, warn};

use super::events::{IncomingMessage, Optin};
use super::outbound::{OutboundEnvelope, SenderAction, MAX_TEMPLATE_BUTTONS};
use super::send_api::MessageSender;

pub const SOCIAL_PROOF_DELAY: Duration = Duration::from_secs(4);
pub const REFERENCE_LINK_DELAY: Duration = Duration::from_secs(3);
pub const COLLECTION_FOLLOW_UP_DELAY: Duration = Duration::from_secs(5);

const QUICK_REPLY_ACK: &str = "Bedankt voor je keuze!";
const SEARCHING_ACK: &str = "Even zoeken...";
const FETCHING_PAINTING_ACK: &str = "Ik haal een schilderij voor je op...";
const NOT_UNDERSTOOD: &str = "Sorry, dat begreep ik niet. Typ de naam van een schilder, \
                              een periode zoals 1600-1700, 'utrecht' of 'surprise'.";
const OPTIN_CONFIRMATION: &str = "Authenticatie gelukt";
const BUTTONS_PROMPT: &str = "Welke schilder bedoel je?";
const REFERENCE_LINK_TEXT: &str = "Benieuwd naar meer kunst?";
const LINK_TITLE: &str = "Bekijk";
const ANOTHER_WORK_PROMPT: &str = "Wil je nog iets van deze schilder zien?";
const ANOTHER_WORK_TITLE: &str = "Ander werk van deze schilder";

/// What a search-bound message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Painters active in a period. `from` is the part after the hyphen.
    ByDate { from: String, to: String },
    Monuments,
    RandomArtist,
    Painters(String),
}

impl SearchQuery {
    /// Classify free text. Input is trimmed and lowercased first.
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        if normalized.contains('-') {
            let mut bounds = normalized.split('-').map(str::trim);
            let first = bounds.next().unwrap_or_default();
            let second = bounds.next().unwrap_or_default();
            return SearchQuery::ByDate {
                from: second.to_string(),
                to: first.to_string(),
            };
        }
        match normalized.as_str() {
            "utrecht" => SearchQuery::Monuments,
            "surprise" => SearchQuery::RandomArtist,
            _ => SearchQuery::Painters(normalized),
        }
    }
}

/// How the composer reacts to an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntent {
    /// The page's own message echoed back.
    Echo,
    QuickReply(String),
    Search(SearchQuery),
    /// Attachment-only or otherwise textless.
    NotUnderstood,
}

impl MessageIntent {
    pub fn of(message: &IncomingMessage) -> Self {
        if message.is_echo {
            MessageIntent::Echo
        } else if let Some(quick_reply) = &message.quick_reply {
            MessageIntent::QuickReply(quick_reply.payload.clone())
        } else if let Some(text) = &message.text {
            MessageIntent::Search(SearchQuery::parse(text))
        } else {
            MessageIntent::NotUnderstood
        }
    }
}

#[derive(Clone)]
pub struct ReplyComposer {
    sender: Arc<dyn MessageSender>,
    search: Arc<dyn SearchBackend>,
    reference_url: String,
}

impl ReplyComposer {
    pub fn new(
        sender: Arc<dyn MessageSender>,
        search: Arc<dyn SearchBackend>,
        reference_url: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            search,
            reference_url: reference_url.into(),
        }
    }

    /// React to a message event.
    pub fn on_message(&self, sender_id: &str, message: IncomingMessage) {
        let message_id = message.message_id.clone().unwrap_or_default();
        match MessageIntent::of(&message) {
            MessageIntent::Echo => {
                info!(
                    message_id = %message_id,
                    app_id = ?message.app_id,
                    metadata = ?message.metadata,
                    "Received echo"
                );
            }
            MessageIntent::QuickReply(payload) => {
                info!(message_id = %message_id, payload = %payload, "Quick reply");
                self.send_later(OutboundEnvelope::text(sender_id, QUICK_REPLY_ACK));
            }
            MessageIntent::Search(query) => {
                info!(sender_id = %sender_id, query = ?query, "Searching");
                let composer = self.clone();
                let recipient = sender_id.to_string();
                tokio::spawn(async move { composer.run_search(recipient, query).await });
            }
            MessageIntent::NotUnderstood => {
                info!(
                    message_id = %message_id,
                    attachments = message.attachments.len(),
                    "Message without text"
                );
                self.send_later(OutboundEnvelope::text(sender_id, NOT_UNDERSTOOD));
            }
        }
    }

    /// React to a postback; the payload is an artist identifier.
    pub fn on_postback(&self, sender_id: &str, payload: String) {
        info!(sender_id = %sender_id, payload = %payload, "Postback");
        let composer = self.clone();
        let recipient = sender_id.to_string();
        tokio::spawn(async move { composer.run_postback(recipient, payload).await });
    }

    /// React to an opt-in from the authentication plugin.
    pub fn on_optin(&self, sender_id: &str, optin: Optin) {
        info!(
            sender_id = %sender_id,
            pass_through = %optin.reference.unwrap_or_default(),
            "Authentication received"
        );
        self.send_later(OutboundEnvelope::text(sender_id, OPTIN_CONFIRMATION));
    }

    async fn run_search(&self, recipient: String, query: SearchQuery) {
        let search = async {
            match &query {
                SearchQuery::ByDate { from, to } => self.search.painter_by_date(from, to).await,
                SearchQuery::Monuments => self.search.get_monuments().await,
                SearchQuery::RandomArtist => self.search.random_artist().await,
                SearchQuery::Painters(text) => self.search.search_painters(text).await,
            }
        };
        let acknowledge = async {
            self.sender
                .send(OutboundEnvelope::text(&recipient, SEARCHING_ACK))
                .await;
            self.sender
                .send(OutboundEnvelope::action(&recipient, SenderAction::TypingOn))
                .await;
        };
        let (result, ()) = tokio::join!(search, acknowledge);

        self.sender
            .send(OutboundEnvelope::action(&recipient, SenderAction::TypingOff))
            .await;

        match result {
            Err(e) => self.send_search_error(&recipient, e).await,
            Ok(SearchResult::Buttons(buttons)) => self.send_buttons(&recipient, buttons).await,
            Ok(SearchResult::Images { images }) => {
                self.send_image(&recipient, &images).await;
                self.schedule_social_proof(&recipient);
                self.schedule(
                    REFERENCE_LINK_DELAY,
                    vec![OutboundEnvelope::link(
                        &recipient,
                        REFERENCE_LINK_TEXT,
                        &self.reference_url,
                        LINK_TITLE,
                    )],
                );
            }
            Ok(SearchResult::Text { text }) => {
                self.sender.send(OutboundEnvelope::text(&recipient, text)).await;
            }
        }
    }

    async fn run_postback(&self, recipient: String, artist_id: String) {
        let search = self.search.paintings_by_artist(&artist_id);
        let acknowledge = self
            .sender
            .send(OutboundEnvelope::text(&recipient, FETCHING_PAINTING_ACK));
        let (result, ()) = tokio::join!(search, acknowledge);

        match result {
            Err(e) => self.send_search_error(&recipient, e).await,
            Ok(SearchResult::Images { images }) => {
                self.send_image(&recipient, &images).await;
                self.schedule_social_proof(&recipient);
                if let Some(collection) = &images.collection {
                    self.schedule(
                        COLLECTION_FOLLOW_UP_DELAY,
                        self.collection_follow_up(&recipient, collection, &images),
                    );
                }
            }
            Ok(SearchResult::Buttons(buttons)) => self.send_buttons(&recipient, buttons).await,
            Ok(SearchResult::Text { text }) => {
                self.sender.send(OutboundEnvelope::text(&recipient, text)).await;
            }
        }
    }

    async fn send_search_error(&self, recipient: &str, error: SearchError) {
        warn!(recipient_id = %recipient, error = %error, "Search failed");
        self.sender
            .send(OutboundEnvelope::text(recipient, error.to_string()))
            .await;
    }

    async fn send_buttons(&self, recipient: &str, result: ButtonsResult) {
        if result.buttons.len() > MAX_TEMPLATE_BUTTONS {
            warn!(
                count = result.buttons.len(),
                "Too many buttons for one template; extra buttons dropped"
            );
        }
        let text = result.text.unwrap_or_else(|| BUTTONS_PROMPT.to_string());
        let buttons = result.buttons.into_iter().map(|b| (b.title, b.payload));
        self.sender
            .send(OutboundEnvelope::buttons(recipient, text, buttons))
            .await;
    }

    /// Caption first, then the image itself.
    async fn send_image(&self, recipient: &str, image: &ImageResult) {
        self.sender
            .send(OutboundEnvelope::text(recipient, caption(image)))
            .await;
        self.sender
            .send(OutboundEnvelope::image(recipient, &image.image))
            .await;
    }

    fn schedule_social_proof(&self, recipient: &str) {
        let text = social_proof_text(&mut rand::thread_rng());
        self.schedule(
            SOCIAL_PROOF_DELAY,
            vec![OutboundEnvelope::text(recipient, text)],
        );
    }

    fn collection_follow_up(
        &self,
        recipient: &str,
        collection: &str,
        image: &ImageResult,
    ) -> Vec<OutboundEnvelope> {
        let link_target = image.url.as_deref().unwrap_or(&self.reference_url);
        let mut envelopes = vec![
            OutboundEnvelope::text(
                recipient,
                format!("Dit werk is te zien in de collectie van {collection}."),
            ),
            OutboundEnvelope::link(recipient, image.label.as_str(), link_target, LINK_TITLE),
        ];
        match &image.author {
            Some(author) => envelopes.push(OutboundEnvelope::buttons(
                recipient,
                ANOTHER_WORK_PROMPT,
                [(ANOTHER_WORK_TITLE.to_string(), author.clone())],
            )),
            None => warn!(image_id = %image.id, "Image has no author; skipping another-work button"),
        }
        envelopes
    }

    /// Send `envelopes` in order after `delay`. No handle is kept.
    fn schedule(&self, delay: Duration, envelopes: Vec<OutboundEnvelope>) {
        let sender = Arc::clone(&self.sender);
        debug!(delay_ms = delay.as_millis() as u64, count = envelopes.len(), "Scheduled follow-up");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for envelope in envelopes {
                sender.send(envelope).await;
            }
        });
    }

    /// Send without waiting for the outcome.
    fn send_later(&self, envelope: OutboundEnvelope) {
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move { sender.send(envelope).await });
    }
}

pub fn caption(image: &ImageResult) -> String {
    format!("Je gaat zo zien: {}, {}", image.label, image.description)
}

/// Two independent draws: viewers in [8, 50] over the last [2, 4] hours.
pub fn social_proof_text<R: Rng>(rng: &mut R) -> String {
    let viewers = rng.gen_range(8..=50);
    let hours = rng.gen_range(2..=4);
    format!("{viewers} mensen hebben dit werk de afgelopen {hours} uur bekeken.")
}
