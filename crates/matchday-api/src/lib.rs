// matchday-api: Async wire layer for live match data (REST + push channel)

pub mod error;
pub mod live;
pub mod rest;
pub mod transport;

pub use error::Error;
pub use live::{
    ClientMessage, Connector, Frame, HttpConnector, InboundMessage, Link, LinkEvent, LinkPeer,
    MatchUpdate, Notification, ReconnectConfig, TransportKind,
};
pub use rest::{CommentaryResponse, MatchClient, RawCommentaryEntry};
pub use transport::{Endpoint, TlsMode, TransportConfig};
