// ── Commentary normalization ──
//
// Turns raw entries from either feed into `CommentaryEntry`. Numbers may
// arrive as integers, floats or strings; anything unrecoverable becomes
// the field's neutral value instead of an error.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use matchday_api::RawCommentaryEntry;

use crate::model::{CommentaryEntry, CommentarySource, Phase};

/// Normalize every entry of one fetch, preserving fetch order.
pub fn normalize_all(raw: &[RawCommentaryEntry]) -> Vec<CommentaryEntry> {
    raw.iter().map(normalize).collect()
}

/// Normalize a single raw entry.
pub fn normalize(raw: &RawCommentaryEntry) -> CommentaryEntry {
    CommentaryEntry {
        id: raw.id.as_ref().and_then(coerce_id),
        over: coerce_count(raw.over.as_ref()).unwrap_or(0),
        ball: coerce_count(raw.ball.as_ref()).unwrap_or(0),
        source: raw
            .source
            .clone()
            .map_or_else(|| CommentarySource::Other(String::new()), CommentarySource::from),
        phase: coerce_phase(raw.phase.as_deref()),
        text: [&raw.text, &raw.commentary, &raw.description]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_default(),
        runs: coerce_count(raw.runs.as_ref()),
        wicket: raw.wicket.as_ref().is_some_and(coerce_flag),
        author: raw.author.as_ref().and_then(coerce_author),
        order: raw.order.as_ref().and_then(coerce_order),
        timestamp: raw.timestamp.as_ref().and_then(coerce_timestamp),
        innings: coerce_count(raw.innings.as_ref()),
    }
}

// ── Field coercion ───────────────────────────────────────────────────

/// Non-negative integer from a number, float, or numeric string.
/// Fractions are truncated (`"3.0"` and `3.7` both give 3).
fn coerce_count(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().and_then(truncate_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_float))
        }
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn truncate_float(v: f64) -> Option<u32> {
    (v.is_finite() && v >= 0.0 && v < f64::from(u32::MAX)).then(|| v.trunc() as u32)
}

fn coerce_phase(tag: Option<&str>) -> Phase {
    match tag {
        None => Phase::Ball,
        Some(tag) => Phase::from_tag(tag).unwrap_or_else(|| {
            debug!(phase = tag, "Unknown commentary phase, treating as ball");
            Phase::Ball
        }),
    }
}

fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

fn coerce_author(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("username"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

fn coerce_order(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// RFC 3339 string or epoch milliseconds.
fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawCommentaryEntry {
        serde_json::from_value(value).unwrap_or_default()
    }

    #[test]
    fn ball_numbers_in_every_shape() {
        assert_eq!(normalize(&raw(json!({ "ball": 4 }))).ball, 4);
        assert_eq!(normalize(&raw(json!({ "ball": "5" }))).ball, 5);
        assert_eq!(normalize(&raw(json!({ "ball": " 6 " }))).ball, 6);
        assert_eq!(normalize(&raw(json!({ "ball": "3.0" }))).ball, 3);
        assert_eq!(normalize(&raw(json!({ "ball": 2.0 }))).ball, 2);
        assert_eq!(normalize(&raw(json!({}))).ball, 0);
        assert_eq!(normalize(&raw(json!({ "ball": "wide" }))).ball, 0);
        assert_eq!(normalize(&raw(json!({ "ball": -1 }))).ball, 0);
        assert_eq!(normalize(&raw(json!({ "ball": null }))).ball, 0);
    }

    #[test]
    fn missing_phase_is_ball_and_tags_are_kept() {
        let entry = normalize(&raw(json!({ "over": 3, "source": "in-house" })));
        assert_eq!(entry.phase, Phase::Ball);
        assert_eq!(entry.source, CommentarySource::InHouse);

        let entry = normalize(&raw(json!({ "phase": "post_ball", "source": "external" })));
        assert_eq!(entry.phase, Phase::PostBall);
        assert_eq!(entry.source, CommentarySource::External);

        let entry = normalize(&raw(json!({ "source": "stats-bot" })));
        assert_eq!(entry.source, CommentarySource::Other("stats-bot".into()));
    }

    #[test]
    fn text_falls_back_across_fields() {
        let entry = normalize(&raw(json!({ "text": "", "commentary": "Driven through covers" })));
        assert_eq!(entry.text, "Driven through covers");

        let entry = normalize(&raw(json!({ "description": "Bouncer" })));
        assert_eq!(entry.text, "Bouncer");
    }

    #[test]
    fn markers_author_order_and_time() {
        let entry = normalize(&raw(json!({
            "id": 991,
            "runs": "4",
            "isWicket": "true",
            "author": { "name": "Scorer One" },
            "order": "2",
            "timestamp": 1_767_225_600_000_i64,
            "innings": 2
        })));

        assert_eq!(entry.id.as_deref(), Some("991"));
        assert_eq!(entry.runs, Some(4));
        assert!(entry.wicket);
        assert_eq!(entry.author.as_deref(), Some("Scorer One"));
        assert_eq!(entry.order, Some(2));
        assert_eq!(
            entry.timestamp,
            DateTime::from_timestamp_millis(1_767_225_600_000)
        );
        assert_eq!(entry.innings, Some(2));
    }

    #[test]
    fn rfc3339_timestamps_and_garbage() {
        let entry = normalize(&raw(json!({ "createdAt": "2026-03-01T10:00:00+05:30" })));
        assert_eq!(
            entry.timestamp.map(|t| t.to_rfc3339()),
            Some("2026-03-01T04:30:00+00:00".to_owned())
        );

        let entry = normalize(&raw(json!({ "timestamp": "yesterday" })));
        assert!(entry.timestamp.is_none());
    }

    #[test]
    fn preserves_fetch_order() {
        let batch = vec![
            raw(json!({ "over": 1, "ball": 1 })),
            raw(json!({ "over": 9, "ball": 9 })),
        ];
        let entries = normalize_all(&batch);
        assert_eq!(entries[0].over, 1);
        assert_eq!(entries[1].over, 9);
    }
}
