// Integration tests for the long-polling push transport using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use matchday_api::{ClientMessage, Connector, HttpConnector, LinkEvent, TransportKind};

async fn connector(server: &MockServer) -> HttpConnector {
    let live = Url::parse(&format!("{}/live", server.uri())).unwrap();
    HttpConnector::from_reqwest(live, reqwest::Client::new())
}

async fn mount_handshake(server: &MockServer, sid: &str) {
    Mock::given(method("GET"))
        .and(path("/live/poll"))
        .and(query_param_is_missing("sid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sid": sid })))
        .mount(server)
        .await;
}

/// Idle long-poll: holds the request, then returns nothing.
async fn mount_idle_poll(server: &MockServer, sid: &str) {
    Mock::given(method("GET"))
        .and(path("/live/poll"))
        .and(query_param("sid", sid))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_polling_delivers_frames() {
    let server = MockServer::start().await;
    mount_handshake(&server, "s1").await;

    Mock::given(method("GET"))
        .and(path("/live/poll"))
        .and(query_param("sid", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "event": "matchStarted", "data": { "matchId": "m1" } },
            { "event": "match-update", "sport": "cricket", "data": { "matchId": "m1", "format": "T20" } }
        ])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_idle_poll(&server, "s1").await;

    let connector = connector(&server).await;
    let mut link = connector.open(TransportKind::Polling).await.unwrap();
    assert_eq!(link.kind(), TransportKind::Polling);

    let mut events = Vec::new();
    for _ in 0..2 {
        match link.recv().await {
            LinkEvent::Frame(frame) => events.push(frame),
            LinkEvent::Closed { reason } => panic!("closed early: {reason}"),
        }
    }

    assert_eq!(events[0].event, "matchStarted");
    assert_eq!(events[1].event, "match-update");
    assert_eq!(events[1].sport.as_deref(), Some("cricket"));
    link.close();
}

#[tokio::test]
async fn test_polling_posts_outbound_frames() {
    let server = MockServer::start().await;
    mount_handshake(&server, "s2").await;
    mount_idle_poll(&server, "s2").await;

    Mock::given(method("POST"))
        .and(path("/live/poll"))
        .and(query_param("sid", "s2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1..)
        .mount(&server)
        .await;

    let connector = connector(&server).await;
    let link = connector.open(TransportKind::Polling).await.unwrap();

    let join = ClientMessage::Subscribe {
        match_id: "m1".into(),
        sport: "cricket".into(),
    };
    link.send(join.to_frame()).await.unwrap();

    let mut posted = None;
    for _ in 0..50 {
        let requests = server.received_requests().await.unwrap_or_default();
        posted = requests
            .into_iter()
            .find(|r| r.method.to_string() == "POST");
        if posted.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let posted = posted.expect("POST was never sent");
    let body: serde_json::Value = serde_json::from_slice(&posted.body).unwrap();
    assert_eq!(
        body,
        json!([{ "event": "subscribe:match", "data": { "matchId": "m1", "sport": "cricket" } }])
    );
    link.close();
}

#[tokio::test]
async fn test_rejected_session_closes_link() {
    let server = MockServer::start().await;
    mount_handshake(&server, "gone").await;

    Mock::given(method("GET"))
        .and(path("/live/poll"))
        .and(query_param("sid", "gone"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let connector = connector(&server).await;
    let mut link = connector.open(TransportKind::Polling).await.unwrap();

    match link.recv().await {
        LinkEvent::Closed { reason } => assert!(reason.contains("no longer valid"), "{reason}"),
        LinkEvent::Frame(frame) => panic!("unexpected frame {frame:?}"),
    }
}

#[tokio::test]
async fn test_failed_handshake_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/live/poll"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let connector = connector(&server).await;
    let err = connector.open(TransportKind::Polling).await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}

#[tokio::test]
async fn test_stream_upgrade_fails_without_websocket_endpoint() {
    let server = MockServer::start().await;

    let connector = connector(&server).await;
    let err = connector.open(TransportKind::Stream).await.unwrap_err();
    assert!(
        matches!(err, matchday_api::Error::WebSocketConnect(_)),
        "got {err:?}"
    );
}
