// ── Commentary merge engine ──
//
// Pure function from one fetch's entries to a single most-recent-first
// feed. Re-run in full on every fetch; never patched incrementally.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use matchday_api::CommentaryResponse;

use super::feed::MergedCommentaryFeed;
use super::normalize::normalize_all;
use crate::model::{CommentaryEntry, CommentarySource, Phase};

/// Total order over entries, most recent first:
///
/// 1. over, descending
/// 2. ball, descending
/// 3. phase rank, ascending (pre-ball, ball, post-ball)
/// 4. between post-ball entries: order hint ascending, hinted before unhinted
/// 5. timestamp, descending, missing timestamps last
pub fn compare(a: &CommentaryEntry, b: &CommentaryEntry) -> Ordering {
    b.over
        .cmp(&a.over)
        .then_with(|| b.ball.cmp(&a.ball))
        .then_with(|| a.phase.rank().cmp(&b.phase.rank()))
        .then_with(|| post_ball_order(a, b))
        .then_with(|| newest_first(a.timestamp, b.timestamp))
}

fn post_ball_order(a: &CommentaryEntry, b: &CommentaryEntry) -> Ordering {
    if a.phase != Phase::PostBall || b.phase != Phase::PostBall {
        return Ordering::Equal;
    }
    match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Drop repeats of the same `(source, id)` within one fetch, keeping the
/// first. Entries without an id are never treated as duplicates.
pub fn dedupe(entries: Vec<CommentaryEntry>) -> Vec<CommentaryEntry> {
    let mut seen: HashSet<(CommentarySource, String)> = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| match &entry.id {
            Some(id) => seen.insert((entry.source.clone(), id.clone())),
            None => true,
        })
        .collect()
}

/// Deduplicate and order one fetch's entries.
///
/// `sort_by` is stable, so entries equal on every key keep fetch order.
pub fn merge(entries: Vec<CommentaryEntry>) -> Vec<CommentaryEntry> {
    let mut entries = dedupe(entries);
    entries.sort_by(compare);
    entries
}

/// Build the full feed (union plus per-innings views) from a REST response.
pub fn merge_response(response: &CommentaryResponse) -> MergedCommentaryFeed {
    MergedCommentaryFeed::new(
        merge(normalize_all(&response.all)),
        merge(normalize_all(&response.first_innings)),
        merge(normalize_all(&response.second_innings)),
    )
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(over: u32, ball: u32, phase: Phase) -> CommentaryEntry {
        CommentaryEntry {
            id: None,
            over,
            ball,
            source: CommentarySource::External,
            phase,
            text: format!("{over}.{ball} {phase}"),
            runs: None,
            wicket: false,
            author: None,
            order: None,
            timestamp: None,
            innings: None,
        }
    }

    fn at(mut e: CommentaryEntry, secs: i64) -> CommentaryEntry {
        e.timestamp = DateTime::from_timestamp(secs, 0);
        e
    }

    fn hinted(mut e: CommentaryEntry, order: i64) -> CommentaryEntry {
        e.order = Some(order);
        e
    }

    fn texts(entries: &[CommentaryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.text.clone()).collect()
    }

    #[test]
    fn over_twelve_scenario() {
        let mut four = entry(12, 3, Phase::Ball);
        four.runs = Some(4);
        let entries = vec![
            four,
            hinted(entry(12, 3, Phase::PostBall), 1),
            entry(12, 4, Phase::Ball),
        ];

        let merged = merge(entries);
        assert_eq!(
            texts(&merged),
            vec!["12.4 ball", "12.3 ball", "12.3 post-ball"]
        );
    }

    #[test]
    fn phases_order_within_a_ball() {
        let merged = merge(vec![
            entry(5, 2, Phase::PostBall),
            entry(5, 2, Phase::Ball),
            entry(5, 2, Phase::PreBall),
        ]);
        assert_eq!(
            texts(&merged),
            vec!["5.2 pre-ball", "5.2 ball", "5.2 post-ball"]
        );
    }

    #[test]
    fn post_ball_hints_then_timestamps() {
        let mut a = at(hinted(entry(7, 1, Phase::PostBall), 2), 100);
        a.text = "hint 2".into();
        let mut b = at(hinted(entry(7, 1, Phase::PostBall), 1), 50);
        b.text = "hint 1".into();
        let mut c = at(entry(7, 1, Phase::PostBall), 300);
        c.text = "no hint, newest".into();
        let mut d = at(entry(7, 1, Phase::PostBall), 200);
        d.text = "no hint, older".into();

        let merged = merge(vec![c, a, d, b]);
        assert_eq!(
            texts(&merged),
            vec!["hint 1", "hint 2", "no hint, newest", "no hint, older"]
        );
    }

    #[test]
    fn hints_ignored_outside_post_ball() {
        let mut early = at(hinted(entry(3, 3, Phase::PreBall), 1), 10);
        early.text = "older".into();
        let mut late = at(hinted(entry(3, 3, Phase::PreBall), 2), 20);
        late.text = "newer".into();

        let merged = merge(vec![early, late]);
        assert_eq!(texts(&merged), vec!["newer", "older"]);
    }

    #[test]
    fn full_ties_keep_fetch_order() {
        let mut first = entry(1, 1, Phase::Ball);
        first.text = "first".into();
        let mut second = entry(1, 1, Phase::Ball);
        second.text = "second".into();
        second.source = CommentarySource::InHouse;

        let merged = merge(vec![first, second]);
        assert_eq!(texts(&merged), vec!["first", "second"]);
    }

    #[test]
    fn stray_pre_ball_without_sibling_is_kept() {
        let merged = merge(vec![entry(9, 6, Phase::Ball), entry(10, 1, Phase::PreBall)]);
        assert_eq!(texts(&merged), vec!["10.1 pre-ball", "9.6 ball"]);
    }

    #[test]
    fn dedupe_by_source_and_id() {
        let mut a = entry(2, 1, Phase::Ball);
        a.id = Some("x".into());
        let mut dup = a.clone();
        dup.text = "duplicate".into();
        let mut other_source = a.clone();
        other_source.source = CommentarySource::InHouse;
        let anonymous = entry(2, 1, Phase::Ball);

        let merged = merge(vec![a, dup, other_source, anonymous.clone(), anonymous]);
        assert_eq!(merged.len(), 4);
        assert!(merged.iter().all(|e| e.text != "duplicate"));
    }

    #[test]
    fn merge_is_deterministic() {
        let entries: Vec<CommentaryEntry> = (0..40_u32)
            .map(|i| {
                let phase = match i % 3 {
                    0 => Phase::PreBall,
                    1 => Phase::Ball,
                    _ => Phase::PostBall,
                };
                let mut e = at(entry(i % 4, i % 6, phase), i64::from(i * 7 % 11));
                if i % 5 == 0 {
                    e.order = Some(i64::from(i % 3));
                }
                e.text = format!("e{i}");
                e
            })
            .collect();

        assert_eq!(merge(entries.clone()), merge(entries));
    }

    #[test]
    fn each_fetch_rebuilds_from_scratch() {
        let response = |body: serde_json::Value| -> CommentaryResponse {
            serde_json::from_value(body).unwrap_or_default()
        };

        let first = merge_response(&response(serde_json::json!({
            "all": [
                { "id": "a", "over": 1, "ball": 1, "source": "external", "text": "one" },
                { "id": "a", "over": 1, "ball": 1, "source": "external", "text": "one again" },
            ],
            "firstInnings": [
                { "id": "a", "over": 1, "ball": 1, "source": "external", "text": "one" },
            ]
        })));
        assert_eq!(first.len(), 1);
        assert_eq!(first.first_innings.len(), 1);
        assert!(first.second_innings.is_empty());

        let second = merge_response(&response(serde_json::json!({
            "all": [
                { "id": "b", "over": 1, "ball": 2, "source": "in-house", "text": "two" },
                { "id": "a", "over": 1, "ball": 1, "source": "external", "text": "one" },
            ]
        })));
        let texts: Vec<&str> = second.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "one"]);
        assert!(second.first_innings.is_empty());
    }

    #[test]
    fn output_respects_precedence_pairwise() {
        let entries: Vec<CommentaryEntry> = (0..60_u32)
            .map(|i| {
                let phase = match i % 3 {
                    0 => Phase::PostBall,
                    1 => Phase::Ball,
                    _ => Phase::PreBall,
                };
                let mut e = at(entry(i % 5, i % 4, phase), i64::from(i % 9));
                if i % 2 == 0 {
                    e.order = Some(i64::from(i % 7));
                }
                e
            })
            .collect();

        let merged = merge(entries);
        for (i, a) in merged.iter().enumerate() {
            for b in &merged[i + 1..] {
                assert_ne!(compare(a, b), Ordering::Greater, "{a:?} placed before {b:?}");
            }
        }
    }
}
