// ── Match store ──
//
// Applies pushed and polled snapshots. Both paths end in the same slice
// replace, so a push and a poll for one match never interleave partially.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use matchday_api::MatchUpdate;

use super::classify::classify_payload;
use super::slice::SnapshotSlice;
use crate::model::{MatchSnapshot, SnapshotOrigin, Sport, SubscriptionKey};
use crate::stream::SnapshotStream;

/// Why an update was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    NotAnObject,
    MissingMatchId,
    Unclassified { match_id: String },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("payload is not an object"),
            Self::MissingMatchId => f.write_str("payload has no match id"),
            Self::Unclassified { match_id } => {
                write!(f, "cannot tell which sport match {match_id} belongs to")
            }
        }
    }
}

/// Result of feeding one snapshot to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied {
        key: SubscriptionKey,
        /// `true` when the store held nothing for this match before.
        is_new: bool,
    },
    Dropped(DropReason),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Reactive store of the latest snapshot per match.
///
/// Thread-safe and lock-free for readers. Each sport slice and each
/// watched match publishes changes over `watch` channels.
pub struct MatchStore {
    cricket: SnapshotSlice,
    football: SnapshotSlice,
    watchers: DashMap<String, watch::Sender<Option<Arc<MatchSnapshot>>>>,
    last_push_at: watch::Sender<Option<DateTime<Utc>>>,
}

impl MatchStore {
    pub fn new() -> Self {
        let (last_push_at, _) = watch::channel(None);
        Self {
            cricket: SnapshotSlice::new(),
            football: SnapshotSlice::new(),
            watchers: DashMap::new(),
            last_push_at,
        }
    }

    // ── Reducer ──────────────────────────────────────────────────────

    /// Apply a pushed `match-update`. Matches nobody holds are stored too,
    /// until [`sweep_unheld`](Self::sweep_unheld) finds them expired.
    pub fn apply(&self, update: &MatchUpdate) -> ApplyOutcome {
        if !update.payload.is_object() {
            return dropped(DropReason::NotAnObject);
        }
        let Some(match_id) = update.match_id() else {
            return dropped(DropReason::MissingMatchId);
        };
        let Some(sport) = classify_payload(update.sport.as_deref(), &update.payload) else {
            return dropped(DropReason::Unclassified { match_id });
        };

        let now = Utc::now();
        self.last_push_at.send_replace(Some(now));

        let key = SubscriptionKey::new(match_id, sport);
        let is_new = self.replace(MatchSnapshot {
            match_id: key.match_id.clone(),
            sport,
            payload: update.payload.clone(),
            origin: SnapshotOrigin::Push,
            received_at: now,
        });
        debug!(match_id = %key.match_id, %sport, legacy = update.legacy, "Applied pushed snapshot");
        ApplyOutcome::Applied { key, is_new }
    }

    /// Apply a snapshot fetched over REST for a known key.
    pub fn apply_rest_snapshot(&self, key: &SubscriptionKey, payload: Value) -> ApplyOutcome {
        if !payload.is_object() {
            return dropped(DropReason::NotAnObject);
        }
        let is_new = self.replace(MatchSnapshot {
            match_id: key.match_id.clone(),
            sport: key.sport,
            payload,
            origin: SnapshotOrigin::Rest,
            received_at: Utc::now(),
        });
        debug!(match_id = %key.match_id, sport = %key.sport, "Applied REST snapshot");
        ApplyOutcome::Applied {
            key: key.clone(),
            is_new,
        }
    }

    /// Forget a match in every slice.
    pub fn evict(&self, match_id: &str) -> Option<Arc<MatchSnapshot>> {
        let removed = self
            .cricket
            .remove(match_id)
            .or_else(|| self.football.remove(match_id));

        if let Some(tx) = self.watchers.get(match_id) {
            tx.send_replace(None);
        }
        self.watchers
            .remove_if(match_id, |_, tx| tx.receiver_count() == 0);

        if removed.is_some() {
            debug!(match_id, "Evicted match snapshot");
        }
        removed
    }

    /// Evict snapshots older than `retention` for matches that are not in
    /// `held` and have no live per-match watcher. Returns how many went.
    pub fn sweep_unheld(&self, held: &HashSet<&str>, retention: Duration) -> usize {
        let now = Utc::now();
        let mut evicted = 0;

        for slice in [&self.cricket, &self.football] {
            for snap in slice.snapshot().iter() {
                if held.contains(snap.match_id.as_str()) || self.is_watched(&snap.match_id) {
                    continue;
                }
                let expired = (now - snap.received_at)
                    .to_std()
                    .is_ok_and(|age| age >= retention);
                // A newer snapshot may have landed since the slice copy was taken.
                if expired && slice.remove_if_current(snap) {
                    self.watchers
                        .remove_if(&snap.match_id, |_, tx| tx.receiver_count() == 0);
                    evicted += 1;
                }
            }
        }

        if evicted > 0 {
            debug!(evicted, "Swept unheld match snapshots");
        }
        evicted
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn get(&self, match_id: &str) -> Option<Arc<MatchSnapshot>> {
        self.cricket
            .get(match_id)
            .or_else(|| self.football.get(match_id))
    }

    pub fn snapshot(&self, sport: Sport) -> Arc<Vec<Arc<MatchSnapshot>>> {
        self.slice(sport).snapshot()
    }

    pub fn len(&self) -> usize {
        self.cricket.len() + self.football.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self, sport: Sport) -> SnapshotStream {
        SnapshotStream::new(self.slice(sport).subscribe())
    }

    pub fn subscribe_cricket(&self) -> SnapshotStream {
        self.subscribe(Sport::Cricket)
    }

    pub fn subscribe_football(&self) -> SnapshotStream {
        self.subscribe(Sport::Football)
    }

    /// Follow one match. Yields `None` until a snapshot arrives and
    /// again after eviction.
    pub fn watch_match(&self, match_id: &str) -> watch::Receiver<Option<Arc<MatchSnapshot>>> {
        self.watchers
            .entry(match_id.to_owned())
            .or_insert_with(|| watch::channel(self.get(match_id)).0)
            .subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// When the last pushed snapshot was accepted.
    pub fn last_push_at(&self) -> Option<DateTime<Utc>> {
        *self.last_push_at.borrow()
    }

    /// Time since the last pushed snapshot.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_push_at().map(|t| Utc::now() - t)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn slice(&self, sport: Sport) -> &SnapshotSlice {
        match sport {
            Sport::Cricket => &self.cricket,
            Sport::Football => &self.football,
        }
    }

    fn is_watched(&self, match_id: &str) -> bool {
        self.watchers
            .get(match_id)
            .is_some_and(|tx| tx.receiver_count() > 0)
    }

    fn replace(&self, snapshot: MatchSnapshot) -> bool {
        let snapshot = Arc::new(snapshot);
        let other = match snapshot.sport {
            Sport::Cricket => &self.football,
            Sport::Football => &self.cricket,
        };
        let moved = other.remove(&snapshot.match_id).is_some();
        let is_new = self.slice(snapshot.sport).replace(Arc::clone(&snapshot)) && !moved;

        if let Some(tx) = self.watchers.get(&snapshot.match_id) {
            tx.send_replace(Some(snapshot));
        }
        is_new
    }
}

impl Default for MatchStore {
    fn default() -> Self {
        Self::new()
    }
}

fn dropped(reason: DropReason) -> ApplyOutcome {
    warn!(%reason, "Dropping match update");
    ApplyOutcome::Dropped(reason)
}
