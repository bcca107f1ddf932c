//! Gourmet lookup client: ranked restaurant candidates for a coordinate pair.
//!
//! The service is a black-box REST endpoint; results are fetched fresh per
//! request and never cached.

use super::CandidateSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conservative bound on the remote call; the service is expected to answer
/// well within this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The ranked reply needs at least this many candidates to be worth sending.
pub const MIN_CANDIDATES: usize = 3;

/// One ranked lookup result. Immutable value: never mutated after retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub restaurant_name: String,
    pub detail_url: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub location: GeoPoint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GourmetError {
    #[error("lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Client for the gourmet lookup API (GET `{base}/{lat}/{lng}`).
#[derive(Clone)]
pub struct GourmetClient {
    base_url: String,
    client: reqwest::Client,
}

impl GourmetClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the ranked candidates for a coordinate pair. Non-success status
    /// or fewer than `MIN_CANDIDATES` results is `Unavailable` (retriable).
    pub async fn lookup(&self, lat: f64, lng: f64) -> Result<Vec<Candidate>, GourmetError> {
        let url = format!("{}/{}/{}", self.base_url, lat, lng);
        let res = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GourmetError::Unavailable(format!("{} {}", status, body)));
        }
        let candidates: Vec<Candidate> = res.json().await?;
        require_ranked(candidates)
    }
}

/// Enforce the minimum candidate count for a usable ranked reply.
fn require_ranked(candidates: Vec<Candidate>) -> Result<Vec<Candidate>, GourmetError> {
    if candidates.len() < MIN_CANDIDATES {
        return Err(GourmetError::Unavailable(format!(
            "only {} candidate(s) returned",
            candidates.len()
        )));
    }
    Ok(candidates)
}

#[async_trait]
impl CandidateSource for GourmetClient {
    async fn lookup(&self, lat: f64, lng: f64) -> Result<Vec<Candidate>, GourmetError> {
        GourmetClient::lookup(self, lat, lng).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(n: usize) -> Candidate {
        Candidate {
            id: format!("c{}", n),
            title: format!("t{}", n),
            restaurant_name: format!("r{}", n),
            detail_url: format!("https://example.com/{}", n),
            closed: false,
            location: GeoPoint::default(),
        }
    }

    #[test]
    fn parses_candidate_json() {
        let json = r#"[{
            "id": "c1",
            "title": "Grilled set meal",
            "restaurantName": "Shokudo",
            "detailUrl": "https://example.com/c1",
            "closed": false,
            "location": {"lat": 35.6, "lng": 139.7}
        }]"#;
        let parsed: Vec<Candidate> = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed[0].restaurant_name, "Shokudo");
        assert_eq!(parsed[0].location.lat, 35.6);
        assert!(!parsed[0].closed);
    }

    #[test]
    fn candidate_optional_fields_default() {
        let json = r#"[{"id": "c", "title": "t", "restaurantName": "r", "detailUrl": "u"}]"#;
        let parsed: Vec<Candidate> = serde_json::from_str(json).expect("parse");
        assert!(!parsed[0].closed);
        assert_eq!(parsed[0].location, GeoPoint::default());
    }

    #[test]
    fn fewer_than_three_candidates_is_unavailable() {
        let err = require_ranked(vec![candidate(1), candidate(2)]).expect_err("should fail");
        assert!(matches!(err, GourmetError::Unavailable(_)));
    }

    #[test]
    fn three_candidates_pass() {
        let ok = require_ranked(vec![candidate(1), candidate(2), candidate(3)]).expect("ok");
        assert_eq!(ok.len(), 3);
    }
}
