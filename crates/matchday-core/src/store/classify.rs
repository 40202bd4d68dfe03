// ── Sport routing for untagged payloads ──
//
// The upstream service does not always tag `match-update` frames with a
// sport. This is the only place that guesses from payload shape.

use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::model::Sport;

/// Fields only a cricket scorecard carries.
const CRICKET_FIELDS: &[&str] = &[
    "innings",
    "currentInnings",
    "format",
    "overs",
    "battingTeam",
    "bowlingTeam",
    "runRate",
    "target",
];

/// Fields only a football scoreline carries.
const FOOTBALL_FIELDS: &[&str] = &[
    "league",
    "competition",
    "goals",
    "homeScore",
    "awayScore",
    "halfTime",
    "minute",
];

/// Decide which slice a snapshot belongs to.
///
/// Order: the envelope's sport tag, then a `sport` field inside the
/// payload, then shape. Returns `None` when nothing matches.
pub fn classify_payload(envelope_tag: Option<&str>, payload: &Value) -> Option<Sport> {
    if let Some(sport) = envelope_tag.and_then(parse_tag) {
        return Some(sport);
    }
    if let Some(sport) = payload.get("sport").and_then(Value::as_str).and_then(parse_tag) {
        return Some(sport);
    }

    let object = payload.as_object()?;
    let has_any = |fields: &[&str]| fields.iter().any(|f| object.contains_key(*f));

    match (has_any(CRICKET_FIELDS), has_any(FOOTBALL_FIELDS)) {
        (true, false) => Some(Sport::Cricket),
        (false, true) => Some(Sport::Football),
        (true, true) => {
            // Cricket scorecards may carry a tournament name under `competition`.
            debug!("Payload matches both sports, preferring cricket");
            Some(Sport::Cricket)
        }
        (false, false) => None,
    }
}

fn parse_tag(tag: &str) -> Option<Sport> {
    match Sport::from_str(tag.trim()) {
        Ok(sport) => Some(sport),
        Err(_) => {
            debug!(tag, "Unrecognized sport tag, falling back to payload shape");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_tag_wins() {
        let payload = json!({ "id": "m1", "league": "Premier" });
        assert_eq!(classify_payload(Some("cricket"), &payload), Some(Sport::Cricket));
        assert_eq!(classify_payload(Some("SOCCER"), &json!({})), Some(Sport::Football));
    }

    #[test]
    fn payload_sport_field_before_shape() {
        let payload = json!({ "id": "m1", "sport": "football", "overs": 3 });
        assert_eq!(classify_payload(None, &payload), Some(Sport::Football));
    }

    #[test]
    fn cricket_shape() {
        let payload = json!({ "id": "m1", "format": "T20", "innings": [] });
        assert_eq!(classify_payload(None, &payload), Some(Sport::Cricket));
    }

    #[test]
    fn league_shape() {
        let payload = json!({ "id": "m2", "league": "La Liga", "homeScore": 1 });
        assert_eq!(classify_payload(None, &payload), Some(Sport::Football));
    }

    #[test]
    fn unknown_tag_falls_back_to_shape() {
        let payload = json!({ "id": "m2", "competition": "Cup" });
        assert_eq!(classify_payload(Some("curling"), &payload), Some(Sport::Football));
    }

    #[test]
    fn unclassifiable() {
        assert_eq!(classify_payload(None, &json!({ "id": "m3", "status": "live" })), None);
        assert_eq!(classify_payload(None, &json!("text")), None);
    }
}
