// REST collaborators: match snapshots and merged commentary.

mod client;
mod models;

pub use client::MatchClient;
pub use models::{CommentaryResponse, RawCommentaryEntry};
