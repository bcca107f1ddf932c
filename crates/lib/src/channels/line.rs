//! Reply API client: delivers one reply per single-use reply token.

use super::ReplyTransport;
use crate::dispatch::{QuickReplyChoice, ReplyAction};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_REPLY_URL: &str = "https://api.line.me/v2/bot/message/reply";

/// Conservative bound on the outbound reply call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("reply request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("reply api error: {status} {body}")]
    Status { status: u16, body: String },
}

impl LineError {
    /// Transport failures and 5xx responses are worth retrying; 4xx (expired
    /// or already-consumed reply token, malformed payload) is terminal.
    pub fn retriable(&self) -> bool {
        match self {
            LineError::Request(_) => true,
            LineError::Status { status, .. } => *status >= 500,
        }
    }
}

/// Client for the platform reply endpoint. Safe for concurrent use across
/// runs; the underlying connection pool is shared.
#[derive(Clone)]
pub struct LineClient {
    reply_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(access_token: String, reply_url: Option<String>) -> Self {
        let reply_url = reply_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_REPLY_URL.to_string());
        Self {
            reply_url,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    /// POST one reply. Any non-2xx response is an error; see
    /// `LineError::retriable` for which ones are worth retrying.
    pub async fn send_reply(
        &self,
        reply_token: &str,
        action: &ReplyAction,
    ) -> Result<(), LineError> {
        let body = ReplyRequest {
            reply_token,
            messages: vec![to_wire(action)],
            notification_disabled: false,
        };
        let res = self
            .client
            .post(&self.reply_url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Status { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl ReplyTransport for LineClient {
    async fn send_reply(&self, reply_token: &str, action: &ReplyAction) -> Result<(), LineError> {
        LineClient::send_reply(self, reply_token, action).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: Vec<WireMessage>,
    notification_disabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_reply: Option<QuickReplyItems>,
}

#[derive(Debug, Serialize)]
struct QuickReplyItems {
    items: Vec<QuickReplyItem>,
}

#[derive(Debug, Serialize)]
struct QuickReplyItem {
    #[serde(rename = "type")]
    kind: &'static str,
    action: WireAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAction {
    #[serde(rename = "type")]
    kind: &'static str,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_text: Option<String>,
}

/// Map a reply action to the platform message shape: a text message,
/// optionally carrying quick-reply items (postback action when a payload is
/// present, share-location action otherwise).
fn to_wire(action: &ReplyAction) -> WireMessage {
    match action {
        ReplyAction::PlainText { text } => WireMessage {
            kind: "text",
            text: text.clone(),
            quick_reply: None,
        },
        ReplyAction::QuickReply { prompt, choices } => WireMessage {
            kind: "text",
            text: prompt.clone(),
            quick_reply: Some(QuickReplyItems {
                items: choices.iter().map(to_wire_item).collect(),
            }),
        },
    }
}

fn to_wire_item(choice: &QuickReplyChoice) -> QuickReplyItem {
    let action = match choice.postback_payload.as_ref() {
        Some(data) => WireAction {
            kind: "postback",
            label: choice.label.clone(),
            data: Some(data.clone()),
            display_text: choice.confirmation_text.clone(),
        },
        None => WireAction {
            kind: "location",
            label: choice.label.clone(),
            data: None,
            display_text: None,
        },
    };
    QuickReplyItem {
        kind: "action",
        action,
    }
}
