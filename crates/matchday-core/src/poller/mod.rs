// ── Fallback pollers ──
//
// REST polling for data the push channel cannot be trusted to deliver:
// the commentary feed always, match snapshots while the channel is down.

mod commentary;
mod snapshot;

pub use commentary::{CommentaryView, FeedState};
pub use snapshot::SnapshotPoller;
