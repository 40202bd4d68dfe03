// Raw REST payloads for the match data service.
//
// Commentary fields are kept loosely typed (`serde_json::Value`) because the
// external and in-house feeds disagree on representation; normalization into
// a canonical entry happens in `matchday-core`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /matches/{id}/commentary?merge=true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryResponse {
    #[serde(default)]
    pub first_innings: Vec<RawCommentaryEntry>,
    #[serde(default)]
    pub second_innings: Vec<RawCommentaryEntry>,
    /// Union of both feeds; this is what the merge engine consumes.
    #[serde(default)]
    pub all: Vec<RawCommentaryEntry>,
}

/// One commentary entry exactly as either feed sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommentaryEntry {
    #[serde(default, alias = "_id")]
    pub id: Option<Value>,
    #[serde(default, alias = "overNumber")]
    pub over: Option<Value>,
    #[serde(default, alias = "ballNumber")]
    pub ball: Option<Value>,
    /// `"external"` or `"in-house"`.
    #[serde(default)]
    pub source: Option<String>,
    /// `"pre-ball"`, `"ball"` or `"post-ball"`.
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub runs: Option<Value>,
    #[serde(default, alias = "isWicket")]
    pub wicket: Option<Value>,
    /// Plain name or `{ "name": ... }` object.
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub order: Option<Value>,
    /// RFC 3339 string or epoch milliseconds.
    #[serde(default, alias = "createdAt")]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub innings: Option<Value>,
}

/// Responses arrive either bare or wrapped in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Wrapped { data: T },
    Bare(T),
}

/// Decode a response body, unwrapping the optional `data` envelope.
pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let body: Body<T> = serde_json::from_str(text)?;
    Ok(match body {
        Body::Wrapped { data } | Body::Bare(data) => data,
    })
}
