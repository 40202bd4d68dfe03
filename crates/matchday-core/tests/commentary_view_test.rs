// Integration tests for `CommentaryView` polling against an in-memory source.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use matchday_api::CommentaryResponse;
use matchday_core::{CommentaryView, CoreError, FeedState, MatchSource};

// ── In-memory commentary source ─────────────────────────────────────

/// Serves whatever `all` currently holds. Queued delays apply to
/// successive fetches in order; `failures` makes the next N fetches fail
/// with a server error.
#[derive(Default)]
struct FakeCommentary {
    all: Mutex<Vec<Value>>,
    delays: Mutex<VecDeque<Duration>>,
    missing: bool,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeCommentary {
    fn push(&self, entry: Value) {
        self.all.lock().unwrap().push(entry);
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl MatchSource for FakeCommentary {
    fn fetch_match<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Value, CoreError>> {
        async move {
            Err(CoreError::MatchNotFound {
                match_id: match_id.to_owned(),
            })
        }
        .boxed()
    }

    fn fetch_commentary<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<CommentaryResponse, CoreError>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let body = json!({ "all": self.all.lock().unwrap().clone() });
        let delay = self.delays.lock().unwrap().pop_front();
        let missing = self.missing;
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if failing {
                return Err(CoreError::FetchFailed {
                    message: "HTTP 503: scorer offline".into(),
                });
            }
            if missing {
                return Err(CoreError::MatchNotFound {
                    match_id: match_id.to_owned(),
                });
            }
            Ok(serde_json::from_value(body).unwrap())
        }
        .boxed()
    }
}

fn ball(over: u32, ball: u32, text: &str) -> Value {
    json!({ "id": text, "over": over, "ball": ball, "source": "in-house", "text": text })
}

fn texts(state: &FeedState) -> Vec<String> {
    state
        .feed()
        .map(|feed| feed.entries().map(|e| e.text.clone()).collect())
        .unwrap_or_default()
}

async fn wait_until(view: &CommentaryView, check: impl FnMut(&FeedState) -> bool) -> FeedState {
    let mut state = view.state();
    let current = state.wait_for(check).await.unwrap().clone();
    current
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn polling_loads_immediately_and_refreshes() {
    let source = Arc::new(FakeCommentary::default());
    source.push(ball(1, 1, "first"));
    let view = CommentaryView::new("m1", source.clone());

    view.start_polling(Duration::from_secs(10));
    let state = wait_until(&view, |s| s.feed().is_some()).await;
    assert_eq!(texts(&state), vec!["first"]);

    source.push(ball(1, 2, "second"));
    let state = wait_until(&view, |s| texts(s).len() == 2).await;
    assert_eq!(texts(&state), vec!["second", "first"]);
}

#[tokio::test(start_paused = true)]
async fn disabled_auto_refresh_freezes_feed() {
    let source = Arc::new(FakeCommentary::default());
    source.push(ball(12, 3, "four"));
    let view = CommentaryView::new("m1", source.clone());
    view.start_polling(Duration::from_secs(10));
    wait_until(&view, |s| s.feed().is_some()).await;

    view.set_auto_refresh(false);
    assert!(!view.auto_refresh());
    source.push(ball(12, 4, "dot"));

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(texts(&view.current()), vec!["four"]);

    // Manual refresh is the only way new entries appear.
    let state = view.refresh().await;
    assert_eq!(texts(&state), vec!["dot", "four"]);

    source.push(ball(12, 5, "six"));
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(texts(&view.current()), vec!["dot", "four"]);

    // Resuming refreshes straight away.
    let before = source.fetches();
    view.set_auto_refresh(true);
    let state = wait_until(&view, |s| texts(s).len() == 3).await;
    assert_eq!(texts(&state), vec!["six", "dot", "four"]);
    assert_eq!(source.fetches(), before + 1);
}

#[tokio::test(start_paused = true)]
async fn pausing_discards_tick_fetch_in_flight() {
    let source = Arc::new(FakeCommentary::default());
    source.push(ball(7, 1, "first"));
    source
        .delays
        .lock()
        .unwrap()
        .extend([Duration::ZERO, Duration::from_secs(5)]);
    let view = CommentaryView::new("m1", source.clone());
    view.start_polling(Duration::from_secs(10));
    wait_until(&view, |s| s.feed().is_some()).await;

    // The tick at 10s starts a fetch that only returns at 15s.
    source.push(ball(7, 2, "second"));
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(source.fetches(), 2);
    view.set_auto_refresh(false);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(texts(&view.current()), vec!["first"]);
    assert_eq!(source.fetches(), 2);
}

#[tokio::test]
async fn transient_failure_keeps_last_feed() {
    let source = Arc::new(FakeCommentary::default());
    source.push(ball(2, 3, "edged"));
    let view = CommentaryView::new("m1", source.clone());
    assert_eq!(texts(&view.refresh().await), vec!["edged"]);

    source.failures.store(1, Ordering::SeqCst);
    let state = view.refresh().await;
    assert!(matches!(state, FeedState::Failed { retryable: true, .. }), "{state:?}");
    assert_eq!(texts(&state), vec!["edged"]);

    source.push(ball(2, 4, "dot"));
    let state = view.refresh().await;
    assert!(matches!(state, FeedState::Ready(_)));
    assert_eq!(texts(&state), vec!["dot", "edged"]);
}

#[tokio::test(start_paused = true)]
async fn not_found_stops_polling() {
    let source = Arc::new(FakeCommentary {
        missing: true,
        ..FakeCommentary::default()
    });
    let view = CommentaryView::new("gone", source.clone());
    view.start_polling(Duration::from_secs(5));

    let state = wait_until(&view, FeedState::is_terminal).await;
    assert!(matches!(state, FeedState::NotFound));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetches(), 1);
}

#[tokio::test(start_paused = true)]
async fn slower_older_fetch_does_not_overwrite_newer() {
    let source = Arc::new(FakeCommentary::default());
    source.push(ball(3, 1, "old"));
    source
        .delays
        .lock()
        .unwrap()
        .extend([Duration::from_secs(8), Duration::from_secs(1)]);
    let view = CommentaryView::new("m1", source.clone());

    let slow = view.refresh();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.push(ball(3, 2, "new"));
        view.refresh().await
    };
    let (_, _) = tokio::join!(slow, fast);

    assert_eq!(texts(&view.current()), vec!["new", "old"]);
}

#[tokio::test(start_paused = true)]
async fn dropped_view_stops_polling_and_discards_in_flight() {
    let source = Arc::new(FakeCommentary::default());
    source.push(ball(1, 1, "only"));
    source.delays.lock().unwrap().push_back(Duration::from_secs(3));

    let view = CommentaryView::new("m1", source.clone());
    let mut state = view.state();
    view.start_polling(Duration::from_secs(5));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.fetches(), 1);
    drop(view);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.fetches(), 1);
    assert!(matches!(*state.borrow_and_update(), FeedState::Loading));
}
