use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::sport::Sport;

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    Push,
    Rest,
}

/// Complete current state of one match. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSnapshot {
    pub match_id: String,
    pub sport: Sport,
    pub payload: Value,
    pub origin: SnapshotOrigin,
    pub received_at: DateTime<Utc>,
}
