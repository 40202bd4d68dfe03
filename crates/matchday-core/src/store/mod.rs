// ── Match state reducer ──
//
// Canonical per-match snapshots, split into one slice per sport. Every
// accepted update replaces a match's snapshot wholesale.

mod classify;
mod match_store;
mod slice;
mod sweep;

pub use classify::classify_payload;
pub use match_store::{ApplyOutcome, DropReason, MatchStore};
pub use sweep::StoreSweeper;
