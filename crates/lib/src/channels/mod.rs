//! Outbound collaborators: the platform reply API and the candidate lookup
//! service. Both are injected capabilities so tests can substitute fakes.

pub mod gourmet;
pub mod line;

pub use gourmet::{Candidate, GeoPoint, GourmetClient, GourmetError};
pub use line::{LineClient, LineError};

use crate::dispatch::ReplyAction;
use async_trait::async_trait;

/// Sends one reply to the platform for a single-use reply token.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    async fn send_reply(&self, reply_token: &str, action: &ReplyAction) -> Result<(), LineError>;
}

/// Ranked candidate lookup keyed by geographic coordinates.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn lookup(&self, lat: f64, lng: f64) -> Result<Vec<Candidate>, GourmetError>;
}
