//! HTTP long-polling transport.
//!
//! Handshake: `GET {live}/poll` returns `{ "sid": "..." }`.
//! Receive: `GET {live}/poll?sid=` blocks until frames are available and
//! returns a JSON array of them (empty on idle timeout).
//! Send: `POST {live}/poll?sid=` with a JSON array of frames.
//! A 400 or 404 on either call means the session is gone.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::frame::Frame;
use super::link::{Link, LinkEvent, LinkPeer, TransportKind};
use crate::error::Error;
use crate::transport::{self, Endpoint, TransportConfig};

/// Request timeouts for one polling session.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollTimeouts {
    /// Handshake and frame posts.
    request: Duration,
    /// Receive calls, which the server holds open.
    receive: Duration,
}

impl From<&TransportConfig> for PollTimeouts {
    fn from(config: &TransportConfig) -> Self {
        Self {
            request: config.timeout_for(Endpoint::Rest),
            receive: config.timeout_for(Endpoint::LongPoll),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Handshake {
    sid: String,
}

/// Perform the polling handshake and spawn the pump.
pub(crate) async fn open_polling(
    http: reqwest::Client,
    live_base: &Url,
    timeouts: PollTimeouts,
) -> Result<Link, Error> {
    let url = live_base.join("poll")?;
    tracing::debug!(url = %url, "Polling handshake");

    let resp = transport::send(http.get(url.clone()), timeouts.request).await?;
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: body,
        });
    }

    let handshake: Handshake = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("invalid polling handshake: {e}"),
        body,
    })?;

    let mut session_url = url;
    session_url
        .query_pairs_mut()
        .append_pair("sid", &handshake.sid);

    tracing::info!(sid = %handshake.sid, "Polling session open");

    let (link, peer) = Link::pair(TransportKind::Polling);
    tokio::spawn(pump(http, session_url, handshake.sid, timeouts, peer));
    Ok(link)
}

/// Keep one long-poll in flight and flush outbound frames as they arrive.
async fn pump(http: reqwest::Client, url: Url, sid: String, timeouts: PollTimeouts, mut peer: LinkPeer) {
    let mut poll = Box::pin(poll_once(&http, &url, &sid, timeouts.receive));

    let reason = loop {
        tokio::select! {
            biased;
            () = peer.cancel.cancelled() => break "closed by client".to_owned(),
            outbound = peer.outbound.recv() => {
                let Some(first) = outbound else {
                    break "link dropped".to_owned();
                };
                let mut batch = vec![first];
                while let Ok(frame) = peer.outbound.try_recv() {
                    batch.push(frame);
                }
                if let Err(e) = post_frames(&http, &url, &sid, &batch, timeouts.request).await {
                    break format!("send failed: {e}");
                }
            }
            result = &mut poll => {
                match result {
                    Ok(frames) => {
                        for frame in frames {
                            if peer.inbound.send(LinkEvent::Frame(frame)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => break format!("poll failed: {e}"),
                }
                poll = Box::pin(poll_once(&http, &url, &sid, timeouts.receive));
            }
        }
    };

    tracing::info!(%sid, %reason, "Polling session closed");
    peer.close(reason).await;
}

async fn poll_once(
    http: &reqwest::Client,
    url: &Url,
    sid: &str,
    timeout: Duration,
) -> Result<Vec<Frame>, Error> {
    let resp = transport::send(http.get(url.clone()), timeout).await?;
    let status = resp.status();
    if session_rejected(status) {
        return Err(Error::SessionLost { sid: sid.to_owned() });
    }
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: body,
        });
    }
    decode_batch(&body)
}

async fn post_frames(
    http: &reqwest::Client,
    url: &Url,
    sid: &str,
    frames: &[Frame],
    timeout: Duration,
) -> Result<(), Error> {
    tracing::debug!(count = frames.len(), "POST polling frames");

    let resp = transport::send(http.post(url.clone()).json(frames), timeout).await?;
    let status = resp.status();
    if session_rejected(status) {
        return Err(Error::SessionLost { sid: sid.to_owned() });
    }
    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(())
}

fn session_rejected(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::NOT_FOUND
}

/// Decode a poll response. Individual malformed frames are skipped so one
/// bad event cannot take the whole batch down.
fn decode_batch(body: &str) -> Result<Vec<Frame>, Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("poll response is not a frame array: {e}"),
            body: body.to_owned(),
        })?;

    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Frame>(value) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed polled frame");
                None
            }
        })
        .collect())
}
