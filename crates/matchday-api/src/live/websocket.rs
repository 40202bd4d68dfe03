//! WebSocket stream transport.
//!
//! Opens `{live}/stream` and pumps JSON text frames between the socket and
//! a [`Link`]. Reconnection is not handled here: when the socket drops the
//! pump reports [`LinkEvent::Closed`] and exits, and the connection manager
//! decides what happens next.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use url::Url;

use super::frame::Frame;
use super::link::{Link, LinkEvent, LinkPeer, TransportKind};
use crate::error::Error;

/// Map the live namespace URL onto its WebSocket endpoint.
///
/// `http` becomes `ws` and `https` becomes `wss`.
pub fn stream_url(live_base: &Url) -> Result<Url, Error> {
    let mut url = live_base.join("stream")?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot use {scheme} for {live_base}")))?;
    Ok(url)
}

/// Perform the WebSocket handshake and spawn the pump.
///
/// Returns once the socket is open; a failed handshake is returned as
/// [`Error::WebSocketConnect`] without spawning anything.
pub async fn open_stream(url: &Url) -> Result<Link, Error> {
    tracing::debug!(url = %url, "Opening WebSocket stream");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri);
    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("WebSocket stream open");

    let (link, peer) = Link::pair(TransportKind::Stream);
    tokio::spawn(pump(ws_stream, peer));
    Ok(link)
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Read frames until the socket or the link goes away.
async fn pump(ws_stream: WsStream, mut peer: LinkPeer) {
    let (mut write, mut read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            biased;
            () = peer.cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                break "closed by client".to_owned();
            }
            outbound = peer.outbound.recv() => {
                let Some(frame) = outbound else {
                    break "link dropped".to_owned();
                };
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, event = %frame.event, "Dropping unencodable frame");
                        continue;
                    }
                };
                if let Err(e) = write.send(tungstenite::Message::Text(text.into())).await {
                    break format!("write failed: {e}");
                }
            }
            message = read.next() => {
                match message {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        forward_text(&text, &peer).await;
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => break close_reason(frame),
                    Some(Err(e)) => break format!("read failed: {e}"),
                    None => break "stream ended".to_owned(),
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    };

    tracing::info!(%reason, "WebSocket stream closed");
    peer.close(reason).await;
}

/// Describe a server-initiated close for the link owner.
fn close_reason(frame: Option<CloseFrame>) -> String {
    let (code, reason) = frame.map_or((1005, String::new()), |cf| {
        (u16::from(cf.code), cf.reason.as_str().to_owned())
    });
    Error::WebSocketClosed { code, reason }.to_string()
}

/// Decode one text message and hand it to the link owner.
async fn forward_text(text: &str, peer: &LinkPeer) {
    match Frame::decode(text) {
        Ok(frame) => {
            let _ = peer.inbound.send(LinkEvent::Frame(frame)).await;
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse WebSocket frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
