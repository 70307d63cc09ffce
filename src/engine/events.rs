use crate::request_id::RequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Provider not configured for this request (no credential, language not mapped).
    Skipped,
    /// Provider answered but nothing in the answer was usable.
    Empty,
    Failed { reason: String },
    QuotaExhausted { reason: String },
    Succeeded,
}

/// One provider attempt within a single proxied call.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttemptEvent {
    pub request_id: RequestId,
    pub provider: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub timestamp: DateTime<Utc>,
}

pub fn attempt(request_id: &RequestId, provider: &str, outcome: AttemptOutcome) -> AttemptEvent {
    AttemptEvent {
        request_id: request_id.clone(),
        provider: provider.to_string(),
        outcome,
        timestamp: Utc::now(),
    }
}
