// ── Push-channel wire format ──
//
// Every message on the `/live` namespace is a JSON text frame:
// `{ "event": "<name>", "data": <payload>, "sport": "<optional tag>" }`.
// Inbound frames decode into the closed `InboundMessage` enum; the event
// name set is fixed at compile time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── Event names ──────────────────────────────────────────────────────

pub const SUBSCRIBE_MATCH: &str = "subscribe:match";
pub const UNSUBSCRIBE_MATCH: &str = "unsubscribe:match";

pub const MATCH_UPDATE: &str = "match-update";
pub const LEGACY_SCORE_UPDATE: &str = "liveScoreUpdate";
pub const MATCH_STARTED: &str = "matchStarted";
pub const MATCH_ENDED: &str = "matchEnded";
pub const GOAL_SCORED: &str = "goalScored";
pub const WICKET_FALLEN: &str = "wicketFallen";
pub const NEW_CONTENT: &str = "newContent";
pub const NOTIFICATION: &str = "notification";

// ── Frame ────────────────────────────────────────────────────────────

/// One named message on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,

    #[serde(default)]
    pub data: Value,

    /// Explicit sport tag carried by the envelope, when the server sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            sport: None,
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = Some(sport.into());
        self
    }

    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::Deserialization {
            message: format!("failed to encode frame: {e}"),
            body: String::new(),
        })
    }

    pub fn decode(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Deserialization {
            message: format!("invalid frame: {e}"),
            body: text.to_owned(),
        })
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Subscribe { match_id: String, sport: String },
    Unsubscribe { match_id: String, sport: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchInterest<'a> {
    match_id: &'a str,
    sport: &'a str,
}

impl ClientMessage {
    pub fn to_frame(&self) -> Frame {
        let (event, match_id, sport) = match self {
            Self::Subscribe { match_id, sport } => (SUBSCRIBE_MATCH, match_id, sport),
            Self::Unsubscribe { match_id, sport } => (UNSUBSCRIBE_MATCH, match_id, sport),
        };
        let data = serde_json::to_value(MatchInterest { match_id, sport }).unwrap_or(Value::Null);
        Frame::new(event, data)
    }
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A full match snapshot pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpdate {
    /// Explicit sport tag from the envelope, if present.
    pub sport: Option<String>,
    /// Complete current-state snapshot (never a diff).
    pub payload: Value,
    /// `true` when received under the legacy `liveScoreUpdate` name.
    pub legacy: bool,
}

impl MatchUpdate {
    /// Match identifier from the payload: `matchId`, `id` or `_id`,
    /// accepting strings and integers.
    pub fn match_id(&self) -> Option<String> {
        ["matchId", "id", "_id"].iter().find_map(|key| match self.payload.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// `notification {type, message}` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Every message kind the server may push.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    MatchUpdate(MatchUpdate),
    MatchStarted(Value),
    MatchEnded(Value),
    GoalScored(Value),
    WicketFallen(Value),
    NewContent(Value),
    Notification(Notification),
    /// Known event name with a payload that does not fit its contract.
    Malformed { event: String, reason: String },
    /// Event name this client does not handle.
    Unknown { event: String },
}

impl InboundMessage {
    pub fn from_frame(frame: Frame) -> Self {
        let Frame { event, data, sport } = frame;
        match event.as_str() {
            MATCH_UPDATE | LEGACY_SCORE_UPDATE => {
                if data.is_object() {
                    Self::MatchUpdate(MatchUpdate {
                        sport,
                        payload: data,
                        legacy: event == LEGACY_SCORE_UPDATE,
                    })
                } else {
                    Self::Malformed {
                        event,
                        reason: "snapshot payload is not an object".into(),
                    }
                }
            }
            MATCH_STARTED => Self::MatchStarted(data),
            MATCH_ENDED => Self::MatchEnded(data),
            GOAL_SCORED => Self::GoalScored(data),
            WICKET_FALLEN => Self::WicketFallen(data),
            NEW_CONTENT => Self::NewContent(data),
            NOTIFICATION => match serde_json::from_value::<Notification>(data) {
                Ok(n) => Self::Notification(n),
                Err(e) => Self::Malformed {
                    event,
                    reason: e.to_string(),
                },
            },
            _ => Self::Unknown { event },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
