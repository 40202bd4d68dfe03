// matchday-core: Live match state and commentary between matchday-api and consumers.

pub mod commentary;
pub mod config;
pub mod error;
pub mod live;
pub mod model;
pub mod poller;
pub mod source;
pub mod store;
pub mod stream;
pub mod subscription;

// ── Primary re-exports ──────────────────────────────────────────────
pub use commentary::{FeedItem, MergedCommentaryFeed};
pub use config::{LiveConfig, TlsVerification};
pub use error::CoreError;
pub use live::{ConnectionState, LiveService, MatchSubscription, Signal};
pub use poller::{CommentaryView, FeedState, SnapshotPoller};
pub use source::MatchSource;
pub use store::{ApplyOutcome, DropReason, MatchStore, StoreSweeper, classify_payload};
pub use stream::{SnapshotStream, SnapshotWatchStream};
pub use subscription::{Release, SubscriptionRegistry};

pub use model::{
    BallLabel, CommentaryEntry, CommentarySource, LiveEvent, MatchSnapshot, Phase, SnapshotOrigin,
    Sport, SubscriptionKey,
};
pub use matchday_api::{ReconnectConfig, TransportKind};
