//! Event classification: a pure decision function mapping one event to the
//! reply it should get. No conversation state is kept, so every reply is
//! computed solely from the current event; that keeps retries simple.

use crate::channels::gourmet::Candidate;
use crate::webhook::{Event, EventKind, MessageKind};
use serde::{Deserialize, Serialize};

/// Fallback reply when no better answer exists for the event.
pub const FALLBACK_TEXT: &str = "not sure how to reply to that.";
/// Prompt asking the user to share their location.
pub const LOCATION_PROMPT: &str = "where are you right now?";
/// Label on the share-location quick-reply choice.
pub const LOCATION_CHOICE_LABEL: &str = "share location";
/// First line of the ranked candidate reply.
pub const RANKED_HEADER: &str = "found some good spots nearby. where do you want to go?";
/// Confirmation text echoed into the chat when the user picks a candidate.
pub const CHOICE_CONFIRMATION: &str = "sounds good";
/// How many candidates the ranked reply shows.
pub const RANKED_CHOICES: usize = 3;

/// One suggested next action on a quick reply. A missing postback payload
/// denotes the platform's share-location action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickReplyChoice {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_text: Option<String>,
}

/// A reply to send back to the platform. Built by `classify` (or the ranked
/// builder after enrichment), persisted on the run record, consumed by the
/// send step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ReplyAction {
    PlainText {
        text: String,
    },
    QuickReply {
        prompt: String,
        choices: Vec<QuickReplyChoice>,
    },
}

/// What the dispatcher decided: reply immediately, or enrich first.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Reply(ReplyAction),
    Enrich { lat: f64, lng: f64 },
}

/// Classify one event. Pure: identical input yields an identical directive.
///
/// Decision table (first match wins): text message -> location prompt;
/// location message -> enrichment; any other message -> fallback text;
/// postback -> echo of its payload; any other event -> fallback text.
pub fn classify(event: &Event) -> Directive {
    match event.kind {
        EventKind::Message => match event.message.as_ref() {
            Some(message) => match message.kind {
                MessageKind::Text => Directive::Reply(location_prompt()),
                MessageKind::Location => match (message.latitude, message.longitude) {
                    (Some(lat), Some(lng)) => Directive::Enrich { lat, lng },
                    // location message without coordinates: nothing to look up
                    _ => Directive::Reply(fallback()),
                },
                MessageKind::Other => Directive::Reply(fallback()),
            },
            None => Directive::Reply(fallback()),
        },
        EventKind::Postback => {
            let text = event
                .postback
                .as_ref()
                .map(|p| p.data.clone())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| FALLBACK_TEXT.to_string());
            Directive::Reply(ReplyAction::PlainText { text })
        }
        EventKind::Other => Directive::Reply(fallback()),
    }
}

fn fallback() -> ReplyAction {
    ReplyAction::PlainText {
        text: FALLBACK_TEXT.to_string(),
    }
}

/// Quick reply with a single share-location choice.
pub fn location_prompt() -> ReplyAction {
    ReplyAction::QuickReply {
        prompt: LOCATION_PROMPT.to_string(),
        choices: vec![QuickReplyChoice {
            label: LOCATION_CHOICE_LABEL.to_string(),
            postback_payload: None,
            confirmation_text: None,
        }],
    }
}

/// Build the ranked candidate reply: a numbered summary of the top candidates
/// plus one postback choice per candidate carrying its detail URL.
/// Callers guarantee at least `RANKED_CHOICES` candidates (the lookup enforces
/// it); extras beyond the top 3 are ignored.
pub fn ranked_quick_reply(candidates: &[Candidate]) -> ReplyAction {
    let top = &candidates[..candidates.len().min(RANKED_CHOICES)];
    let mut prompt = String::from(RANKED_HEADER);
    let mut choices = Vec::with_capacity(top.len());
    for (i, candidate) in top.iter().enumerate() {
        prompt.push('\n');
        prompt.push_str(&format!(
            "{}: {} ({})",
            i + 1,
            candidate.title,
            candidate.restaurant_name
        ));
        choices.push(QuickReplyChoice {
            label: format!("no. {}", i + 1),
            postback_payload: Some(candidate.detail_url.clone()),
            confirmation_text: Some(CHOICE_CONFIRMATION.to_string()),
        });
    }
    ReplyAction::QuickReply { prompt, choices }
}
