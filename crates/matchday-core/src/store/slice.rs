// ── Per-sport snapshot slice ──
//
// Lock-free storage keyed by match id, with a whole-slice snapshot
// rebuilt on every mutation and pushed to `watch` subscribers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::MatchSnapshot;

pub(crate) type SliceSnapshot = Arc<Vec<Arc<MatchSnapshot>>>;

pub(crate) struct SnapshotSlice {
    by_id: DashMap<String, Arc<MatchSnapshot>>,

    /// Full slice contents, rebuilt on mutation.
    snapshot: watch::Sender<SliceSnapshot>,
}

impl SnapshotSlice {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Replace the snapshot for a match. Returns `true` if the match was new.
    pub(crate) fn replace(&self, snapshot: Arc<MatchSnapshot>) -> bool {
        let is_new = self
            .by_id
            .insert(snapshot.match_id.clone(), snapshot)
            .is_none();
        self.rebuild_snapshot();
        is_new
    }

    pub(crate) fn remove(&self, match_id: &str) -> Option<Arc<MatchSnapshot>> {
        let removed = self.by_id.remove(match_id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    /// Remove `snapshot` only if it is still the stored one for its match.
    pub(crate) fn remove_if_current(&self, snapshot: &Arc<MatchSnapshot>) -> bool {
        let removed = self
            .by_id
            .remove_if(&snapshot.match_id, |_, current| Arc::ptr_eq(current, snapshot))
            .is_some();
        if removed {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, match_id: &str) -> Option<Arc<MatchSnapshot>> {
        self.by_id.get(match_id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn snapshot(&self) -> SliceSnapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SliceSnapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<MatchSnapshot>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| a.match_id.cmp(&b.match_id));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
