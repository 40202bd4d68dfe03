// REST client for the match data service.
//
// Base path: the service root (e.g. `https://scores.example.com/api/`).
// Endpoints: `matches/{id}` and `matches/{id}/commentary?merge=true`.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::models::{CommentaryResponse, decode_body};
use crate::error::Error;
use crate::transport::{self, Endpoint, TransportConfig};

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the match snapshot and commentary endpoints.
///
/// The data service owns persistence; this client only reads.
#[derive(Clone)]
pub struct MatchClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: std::time::Duration,
}

impl MatchClient {
    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let mut client = Self::from_reqwest(base_url, http)?;
        client.timeout = transport.timeout_for(Endpoint::Rest);
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client` with the default request timeout.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http,
            base_url,
            timeout: TransportConfig::default().timeout_for(Endpoint::Rest),
        })
    }

    /// The normalized service root (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /matches/{id}`: the full current snapshot of one match.
    pub async fn get_match(&self, match_id: &str) -> Result<serde_json::Value, Error> {
        let url = self.match_url(match_id, None)?;
        self.get(url, match_id).await
    }

    /// `GET /matches/{id}/commentary?merge=true`.
    pub async fn get_commentary(&self, match_id: &str) -> Result<CommentaryResponse, Error> {
        let mut url = self.match_url(match_id, Some("commentary"))?;
        url.query_pairs_mut().append_pair("merge", "true");
        self.get(url, match_id).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn match_url(&self, match_id: &str, tail: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty().push("matches").push(match_id);
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    // ── Request / response ───────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url, match_id: &str) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = transport::send(self.http.get(url), self.timeout).await?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                resource: format!("match {match_id}"),
            });
        }

        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message.or(e.error))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_owned());
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        decode_body(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
