// ── Snapshot fallback poller ──
//
// While the push channel is not connected, re-fetch every held match over
// REST on a fixed interval and feed the results through the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::live::ConnectionState;
use crate::model::SubscriptionKey;
use crate::source::MatchSource;
use crate::store::MatchStore;

pub struct SnapshotPoller {
    source: Arc<dyn MatchSource>,
    store: Arc<MatchStore>,
    state: watch::Receiver<ConnectionState>,
    keys: watch::Receiver<Vec<SubscriptionKey>>,
    interval: Duration,
}

impl SnapshotPoller {
    pub fn new(
        source: Arc<dyn MatchSource>,
        store: Arc<MatchStore>,
        state: watch::Receiver<ConnectionState>,
        keys: watch::Receiver<Vec<SubscriptionKey>>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            state,
            keys,
            interval,
        }
    }

    /// Fetch every held match once. Returns how many snapshots were applied.
    pub async fn poll_once(&self) -> usize {
        let keys = self.keys.borrow().clone();
        let mut applied = 0;

        for key in keys {
            match self.source.fetch_match(&key.match_id).await {
                Ok(payload) => {
                    if !self.still_wanted(&key) {
                        debug!(%key, "Discarding polled snapshot");
                        continue;
                    }
                    if self.store.apply_rest_snapshot(&key, payload).is_applied() {
                        applied += 1;
                    }
                }
                Err(e) if e.is_not_found() => {
                    debug!(%key, "Match not found while polling");
                }
                Err(e) => {
                    warn!(%key, error = %e, "Snapshot poll failed");
                }
            }
        }
        applied
    }

    /// A fetched snapshot is applied only while its key is still held and
    /// the push channel is still down; otherwise it may resurrect a
    /// released match or overwrite a newer pushed update.
    fn still_wanted(&self, key: &SubscriptionKey) -> bool {
        self.keys.borrow().contains(key) && !self.state.borrow().is_connected()
    }

    /// Poll until cancelled, skipping ticks while the push channel is up.
    pub async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.state.borrow().is_connected() {
                        continue;
                    }
                    let applied = tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        applied = self.poll_once() => applied,
                    };
                    debug!(applied, "Polled match snapshots");
                }
            }
        }
    }
}
