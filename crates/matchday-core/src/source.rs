// ── REST data source seam ──
//
// The live service and pollers fetch through `MatchSource` so tests can
// substitute an in-memory source for the HTTP client.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use matchday_api::{CommentaryResponse, MatchClient};

use crate::error::CoreError;

/// Pull-based access to match snapshots and commentary.
pub trait MatchSource: Send + Sync {
    /// Full current snapshot of one match.
    fn fetch_match<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Value, CoreError>>;

    /// Both commentary feeds for one match.
    fn fetch_commentary<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<CommentaryResponse, CoreError>>;
}

impl MatchSource for MatchClient {
    fn fetch_match<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Value, CoreError>> {
        async move {
            self.get_match(match_id)
                .await
                .map_err(|e| CoreError::for_match(e, match_id))
        }
        .boxed()
    }

    fn fetch_commentary<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<CommentaryResponse, CoreError>> {
        async move {
            self.get_commentary(match_id)
                .await
                .map_err(|e| CoreError::for_match(e, match_id))
        }
        .boxed()
    }
}
