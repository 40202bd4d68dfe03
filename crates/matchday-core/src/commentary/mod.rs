//! Commentary pipeline: raw REST entries from the external and in-house
//! feeds are normalized, deduplicated and merged into one feed.

pub mod feed;
pub mod merge;
pub mod normalize;

pub use feed::{FeedItem, MergedCommentaryFeed};
pub use merge::{compare, merge, merge_response};
pub use normalize::{normalize, normalize_all};
