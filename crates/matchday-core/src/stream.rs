// ── Reactive snapshot streams ──
//
// Subscription type for consuming one sport slice of the match store.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::MatchSnapshot;

type Snapshots = Arc<Vec<Arc<MatchSnapshot>>>;

/// A subscription to every snapshot in one sport slice.
///
/// Provides both point-in-time access and change notification via
/// [`changed`](Self::changed) or by converting into a `Stream`.
pub struct SnapshotStream {
    current: Snapshots,
    receiver: watch::Receiver<Snapshots>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshots>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation time or at the last `changed()`.
    pub fn current(&self) -> &Snapshots {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshots {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Snapshots> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding the whole slice on every mutation.
pub struct SnapshotWatchStream {
    inner: WatchStream<Snapshots>,
}

impl Stream for SnapshotWatchStream {
    type Item = Snapshots;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
