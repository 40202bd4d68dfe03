// ── Subscription registry ──
//
// Reference-counts local interest in matches and decides when join and
// leave messages go on the wire. Owned by the connection task; the active
// key set is published over `watch` for the snapshot poller.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::watch;
use tracing::debug;

use matchday_api::ClientMessage;

use crate::model::SubscriptionKey;

/// What releasing one reference did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// The key was not held. Nothing changed.
    NotHeld,
    /// Other holders remain.
    StillHeld { remaining: usize },
    /// Last reference gone. `leave` is set when the key was joined on the
    /// current session.
    Released { leave: Option<ClientMessage> },
}

pub struct SubscriptionRegistry {
    counts: BTreeMap<SubscriptionKey, usize>,
    /// Keys joined on the current session. Cleared on disconnect.
    joined: BTreeSet<SubscriptionKey>,
    connected: bool,
    active: watch::Sender<Vec<SubscriptionKey>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        let (active, _) = watch::channel(Vec::new());
        Self {
            counts: BTreeMap::new(),
            joined: BTreeSet::new(),
            connected: false,
            active,
        }
    }

    /// Take one reference. Returns the join to send on a 0→1 transition
    /// while connected; otherwise the join waits for the next connect.
    pub fn subscribe(&mut self, key: SubscriptionKey) -> Option<ClientMessage> {
        let count = self.counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return None;
        }
        self.publish();
        self.join(&key)
    }

    /// Drop one reference.
    pub fn unsubscribe(&mut self, key: &SubscriptionKey) -> Release {
        let Some(count) = self.counts.get_mut(key) else {
            debug!(%key, "Unsubscribe for a key that is not held");
            return Release::NotHeld;
        };
        *count -= 1;
        if *count > 0 {
            return Release::StillHeld { remaining: *count };
        }

        self.counts.remove(key);
        self.publish();
        let was_joined = self.joined.remove(key);
        Release::Released {
            leave: (self.connected && was_joined).then(|| key.leave_message()),
        }
    }

    /// A session opened. Returns one join per held key not yet joined on it.
    pub fn on_connected(&mut self) -> Vec<ClientMessage> {
        self.connected = true;
        let keys: Vec<SubscriptionKey> = self.counts.keys().cloned().collect();
        keys.iter().filter_map(|key| self.join(key)).collect()
    }

    /// The session ended. Every key must be joined again on the next one.
    pub fn on_disconnected(&mut self) {
        self.connected = false;
        self.joined.clear();
    }

    pub fn count(&self, key: &SubscriptionKey) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn is_joined(&self, key: &SubscriptionKey) -> bool {
        self.joined.contains(key)
    }

    /// Keys with a positive count, in key order.
    pub fn active_keys(&self) -> Vec<SubscriptionKey> {
        self.counts.keys().cloned().collect()
    }

    /// Follow the active key set.
    pub fn watch_active(&self) -> watch::Receiver<Vec<SubscriptionKey>> {
        self.active.subscribe()
    }

    fn join(&mut self, key: &SubscriptionKey) -> Option<ClientMessage> {
        (self.connected && self.joined.insert(key.clone())).then(|| key.join_message())
    }

    fn publish(&self) {
        let keys = self.active_keys();
        self.active.send_modify(|active| *active = keys);
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
