// ── Domain model ──
//
// Canonical types shared by the reducer, the commentary engine and
// consumers. Wire shapes live in `matchday-api`; everything here has
// already been validated or normalized.

pub mod commentary;
pub mod event;
pub mod key;
pub mod snapshot;
pub mod sport;

pub use commentary::{BallLabel, CommentaryEntry, CommentarySource, Phase};
pub use event::LiveEvent;
pub use key::SubscriptionKey;
pub use snapshot::{MatchSnapshot, SnapshotOrigin};
pub use sport::Sport;
