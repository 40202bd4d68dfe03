// ── Unheld snapshot sweeper ──
//
// Pushed updates for matches nobody holds are kept for a while so a late
// subscriber starts from recent data, then dropped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::MatchStore;
use crate::model::SubscriptionKey;

pub struct StoreSweeper {
    store: Arc<MatchStore>,
    keys: watch::Receiver<Vec<SubscriptionKey>>,
    retention: Duration,
}

impl StoreSweeper {
    pub fn new(
        store: Arc<MatchStore>,
        keys: watch::Receiver<Vec<SubscriptionKey>>,
        retention: Duration,
    ) -> Self {
        Self {
            store,
            keys,
            retention,
        }
    }

    /// Evict expired snapshots for matches without a holder.
    pub fn sweep_once(&self) -> usize {
        let keys = self.keys.borrow().clone();
        let held: HashSet<&str> = keys.iter().map(|k| k.match_id.as_str()).collect();
        self.store.sweep_unheld(&held, self.retention)
    }

    pub async fn run(self, cancel: CancellationToken) {
        let period = self.retention.max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.sweep_once();
                }
            }
        }
    }
}
