//! Webhook event model and decoder.
//!
//! The envelope is decoded after signature verification. Unknown fields and
//! unrecognized type strings are tolerated (forward compatibility); only
//! structurally required fields fail the decode.

use serde::{Deserialize, Serialize};

/// Decode failure for a webhook body: malformed JSON or a required field missing.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed webhook body: {0}")]
    Json(#[from] serde_json::Error),
}

/// One webhook delivery: destination bot and an ordered list of events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Event type. Unrecognized strings (follow, unfollow, join, ...) decode to Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Message,
    Postback,
    #[serde(other)]
    Other,
}

/// A platform event. The reply token is single-use and opaque; it is the only
/// field required to be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub reply_token: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

/// Sender identity (user or channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Message type. Unrecognized strings (sticker, image, ...) decode to Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Location,
    #[serde(other)]
    Other,
}

/// Message payload. Type-specific fields are optional so a text message
/// without location fields (and vice versa) decodes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Postback payload reported by a user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Postback {
    #[serde(default)]
    pub data: String,
}

/// Decode a raw webhook body into the typed envelope.
pub fn decode_envelope(body: &[u8]) -> Result<WebhookEnvelope, DecodeError> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_text_message_event() {
        let body = br#"{
            "destination": "U-dest",
            "events": [{
                "type": "message",
                "replyToken": "tok-1",
                "timestamp": 1700000000000,
                "source": {"type": "user", "userId": "U-abc"},
                "message": {"id": "m1", "type": "text", "text": "hello"}
            }]
        }"#;
        let envelope = decode_envelope(body).expect("decode");
        assert_eq!(envelope.destination, "U-dest");
        assert_eq!(envelope.events.len(), 1);
        let event = &envelope.events[0];
        assert_eq!(event.kind, EventKind::Message);
        assert_eq!(event.reply_token, "tok-1");
        let message = event.message.as_ref().expect("message");
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.latitude, None);
    }

    #[test]
    fn decodes_location_message_event() {
        let body = br#"{
            "events": [{
                "type": "message",
                "replyToken": "tok-2",
                "message": {
                    "type": "location",
                    "title": "Somewhere",
                    "address": "1-2-3",
                    "latitude": 35.68,
                    "longitude": 139.76
                }
            }]
        }"#;
        let envelope = decode_envelope(body).expect("decode");
        let message = envelope.events[0].message.as_ref().expect("message");
        assert_eq!(message.kind, MessageKind::Location);
        assert_eq!(message.latitude, Some(35.68));
        assert_eq!(message.longitude, Some(139.76));
        assert_eq!(message.text, None);
    }

    #[test]
    fn decodes_postback_event() {
        let body = br#"{
            "events": [{
                "type": "postback",
                "replyToken": "T1",
                "postback": {"data": "https://example.com/x"}
            }]
        }"#;
        let envelope = decode_envelope(body).expect("decode");
        let event = &envelope.events[0];
        assert_eq!(event.kind, EventKind::Postback);
        assert_eq!(event.postback.as_ref().map(|p| p.data.as_str()), Some("https://example.com/x"));
    }

    #[test]
    fn unknown_event_and_message_types_decode_to_other() {
        let body = br#"{
            "events": [
                {"type": "follow", "replyToken": "t1"},
                {"type": "message", "replyToken": "t2", "message": {"type": "sticker"}}
            ]
        }"#;
        let envelope = decode_envelope(body).expect("decode");
        assert_eq!(envelope.events[0].kind, EventKind::Other);
        assert_eq!(
            envelope.events[1].message.as_ref().map(|m| m.kind),
            Some(MessageKind::Other)
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let body = br#"{
            "destination": "d",
            "somethingNew": {"a": 1},
            "events": [{
                "type": "message",
                "replyToken": "t",
                "mode": "active",
                "webhookEventId": "we-1",
                "message": {"type": "text", "text": "hi", "emojis": []}
            }]
        }"#;
        assert!(decode_envelope(body).is_ok());
    }

    #[test]
    fn missing_reply_token_is_a_decode_error() {
        let body = br#"{"events": [{"type": "message"}]}"#;
        assert!(decode_envelope(body).is_err());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(decode_envelope(b"{not json").is_err());
    }

    #[test]
    fn empty_events_list_decodes() {
        let envelope = decode_envelope(br#"{"destination": "d", "events": []}"#).expect("decode");
        assert!(envelope.events.is_empty());
    }
}
