// ── Commentary view ──
//
// Owns the merged feed for one match on one screen. The feed is rebuilt
// from a full REST fetch on every refresh; nothing is patched in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::commentary::{MergedCommentaryFeed, merge_response};
use crate::error::CoreError;
use crate::source::MatchSource;

/// What a commentary view currently shows.
#[derive(Debug, Clone)]
pub enum FeedState {
    /// No fetch has completed yet.
    Loading,
    Ready(Arc<MergedCommentaryFeed>),
    /// The last fetch failed. `last` keeps the feed shown before it.
    Failed {
        message: String,
        retryable: bool,
        last: Option<Arc<MergedCommentaryFeed>>,
    },
    /// The match does not exist. Polling stops.
    NotFound,
}

impl FeedState {
    /// The feed to display, including the one kept across a failure.
    pub fn feed(&self) -> Option<&Arc<MergedCommentaryFeed>> {
        match self {
            Self::Ready(feed) | Self::Failed { last: Some(feed), .. } => Some(feed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// What started a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Tick,
    Manual,
}

/// Per-view owner of one match's merged commentary.
///
/// Dropping the view (or calling [`close`](Self::close)) stops polling
/// and discards any fetch still in flight.
pub struct CommentaryView {
    inner: Arc<ViewInner>,
}

struct ViewInner {
    match_id: String,
    source: Arc<dyn MatchSource>,
    state: watch::Sender<FeedState>,
    auto_refresh: watch::Sender<bool>,
    /// Last generation handed to a fetch.
    issued: AtomicU64,
    /// Generation of the result currently shown.
    applied: AtomicU64,
    polling: AtomicBool,
    cancel: CancellationToken,
}

impl CommentaryView {
    pub fn new(match_id: impl Into<String>, source: Arc<dyn MatchSource>) -> Self {
        let (state, _) = watch::channel(FeedState::Loading);
        let (auto_refresh, _) = watch::channel(true);
        Self {
            inner: Arc::new(ViewInner {
                match_id: match_id.into(),
                source,
                state,
                auto_refresh,
                issued: AtomicU64::new(0),
                applied: AtomicU64::new(0),
                polling: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn match_id(&self) -> &str {
        &self.inner.match_id
    }

    /// Follow the feed state.
    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.inner.state.subscribe()
    }

    pub fn current(&self) -> FeedState {
        self.inner.state.borrow().clone()
    }

    /// Fetch and re-merge now, regardless of the auto-refresh setting.
    pub async fn refresh(&self) -> FeedState {
        self.inner.refresh(Trigger::Manual).await;
        self.current()
    }

    /// Start the fixed-interval refresh task. The first fetch happens
    /// immediately. Calling this again is a no-op.
    pub fn start_polling(&self, interval: Duration) {
        if self.inner.polling.swap(true, Ordering::SeqCst) {
            return;
        }
        tokio::spawn(poll_loop(Arc::clone(&self.inner), interval));
    }

    /// Pause or resume automatic refresh. While paused the feed only
    /// changes through [`refresh`](Self::refresh), and a tick fetch already
    /// in flight is discarded. Resuming refreshes at once.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.inner.auto_refresh.send_if_modified(|current| {
            let changed = *current != enabled;
            *current = enabled;
            changed
        });
    }

    pub fn auto_refresh(&self) -> bool {
        *self.inner.auto_refresh.borrow()
    }

    /// Stop polling and ignore fetches still in flight.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl Drop for CommentaryView {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl ViewInner {
    async fn refresh(&self, trigger: Trigger) {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return,
            result = self.source.fetch_commentary(&self.match_id) => result,
        };

        let next = match result {
            Ok(response) => {
                let feed = merge_response(&response);
                debug!(match_id = %self.match_id, entries = feed.len(), generation, "Commentary merged");
                FeedState::Ready(Arc::new(feed))
            }
            Err(CoreError::MatchNotFound { .. }) => {
                debug!(match_id = %self.match_id, "Commentary not found");
                FeedState::NotFound
            }
            Err(e) => {
                warn!(match_id = %self.match_id, error = %e, "Commentary fetch failed");
                FeedState::Failed {
                    retryable: e.is_retryable(),
                    message: e.to_string(),
                    last: None,
                }
            }
        };

        self.publish(generation, trigger, next);
    }

    /// Show `next` unless the view closed, a newer fetch already landed,
    /// or it came from a tick after auto-refresh was switched off.
    fn publish(&self, generation: u64, trigger: Trigger, mut next: FeedState) {
        self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() || self.applied.load(Ordering::SeqCst) >= generation {
                debug!(match_id = %self.match_id, generation, "Discarding stale commentary result");
                return false;
            }
            if trigger == Trigger::Tick && !*self.auto_refresh.borrow() {
                debug!(match_id = %self.match_id, generation, "Discarding tick result while paused");
                return false;
            }
            if let FeedState::Failed { last, .. } = &mut next {
                *last = state.feed().cloned();
            }
            self.applied.store(generation, Ordering::SeqCst);
            *state = next;
            true
        });
    }

    fn is_terminal(&self) -> bool {
        self.state.borrow().is_terminal()
    }
}

async fn poll_loop(inner: Arc<ViewInner>, period: Duration) {
    let mut auto = inner.auto_refresh.subscribe();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            changed = auto.changed() => {
                if changed.is_err() {
                    break;
                }
                if *auto.borrow_and_update() {
                    debug!(match_id = %inner.match_id, "Auto-refresh resumed");
                    inner.refresh(Trigger::Tick).await;
                    interval.reset();
                }
            }
            _ = interval.tick() => {
                if *auto.borrow() {
                    inner.refresh(Trigger::Tick).await;
                }
            }
        }

        if inner.is_terminal() {
            debug!(match_id = %inner.match_id, "Commentary polling stopped");
            break;
        }
    }
}
