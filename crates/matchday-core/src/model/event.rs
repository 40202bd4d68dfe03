// ── Discrete live notifications ──

use serde::Serialize;
use serde_json::Value;

/// A discrete event pushed by the server. Score state travels separately
/// as snapshots; these are for toasts, badges and feed refresh hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LiveEvent {
    MatchStarted { payload: Value },
    MatchEnded { payload: Value },
    GoalScored { payload: Value },
    WicketFallen { payload: Value },
    NewContent { payload: Value },
    Notification { category: String, message: String },
}

impl LiveEvent {
    /// Match this event refers to, if the payload names one.
    pub fn match_id(&self) -> Option<String> {
        let payload = match self {
            Self::MatchStarted { payload }
            | Self::MatchEnded { payload }
            | Self::GoalScored { payload }
            | Self::WicketFallen { payload }
            | Self::NewContent { payload } => payload,
            Self::Notification { .. } => return None,
        };
        ["matchId", "match_id", "id"].iter().find_map(|key| match payload.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn match_id_from_payload() {
        let event = LiveEvent::WicketFallen {
            payload: json!({ "matchId": "m1", "batter": "Smith" }),
        };
        assert_eq!(event.match_id().as_deref(), Some("m1"));

        let event = LiveEvent::GoalScored {
            payload: json!({ "id": 42 }),
        };
        assert_eq!(event.match_id().as_deref(), Some("42"));

        let event = LiveEvent::Notification {
            category: "info".into(),
            message: "hi".into(),
        };
        assert!(event.match_id().is_none());
    }
}
