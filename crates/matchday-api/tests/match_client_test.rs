// Integration tests for `MatchClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use matchday_api::{Error, MatchClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MatchClient) {
    let server = MockServer::start().await;
    let client = MatchClient::from_reqwest(&format!("{}/api", server.uri()), reqwest::Client::new())
        .unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_match_bare_snapshot() {
    let (server, client) = setup().await;

    let body = json!({
        "matchId": "ind-aus-3",
        "format": "ODI",
        "innings": [{ "team": "IND", "runs": 212, "wickets": 4, "overs": 38.2 }]
    });

    Mock::given(method("GET"))
        .and(path("/api/matches/ind-aus-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let snapshot = client.get_match("ind-aus-3").await.unwrap();
    assert_eq!(snapshot, body);
}

#[tokio::test]
async fn test_get_match_wrapped_snapshot() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/matches/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "id": 77, "league": "Premier League", "score": { "home": 1, "away": 0 } }
        })))
        .mount(&server)
        .await;

    let snapshot = client.get_match("77").await.unwrap();
    assert_eq!(snapshot["league"], "Premier League");
    assert!(snapshot.get("success").is_none());
}

#[tokio::test]
async fn test_get_commentary_requests_merged_feed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/matches/m1/commentary"))
        .and(query_param("merge", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "firstInnings": [{ "over": 1, "ball": 1, "source": "external", "text": "dot" }],
            "secondInnings": [],
            "all": [
                { "over": 1, "ball": 1, "source": "external", "text": "dot" },
                { "over": 1, "ball": "2", "source": "in-house", "phase": "post-ball", "order": 1 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let feed = client.get_commentary("m1").await.unwrap();
    assert_eq!(feed.first_innings.len(), 1);
    assert!(feed.second_innings.is_empty());
    assert_eq!(feed.all.len(), 2);
    assert_eq!(feed.all[1].phase.as_deref(), Some("post-ball"));
    assert_eq!(feed.all[1].ball, Some(json!("2")));
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_match_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/matches/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Match not found" })))
        .mount(&server)
        .await;

    let err = client.get_match("nope").await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got {err:?}");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/matches/m1/commentary"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "upstream down" })))
        .mount(&server)
        .await;

    let err = client.get_commentary("m1").await.unwrap_err();
    match &err {
        Error::Http { status, message } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_invalid_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/matches/m1/commentary"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.get_commentary("m1").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got {err:?}");
}

// ── Transport settings ──────────────────────────────────────────────

#[tokio::test]
async fn test_built_client_asks_for_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/matches/m1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = MatchClient::new(&format!("{}/api", server.uri()), &TransportConfig::default()).unwrap();
    assert_eq!(client.get_match("m1").await.unwrap()["id"], "m1");
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/matches/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "slow" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig {
        timeout: Duration::from_secs(1),
        ..TransportConfig::default()
    };
    let client = MatchClient::new(&format!("{}/api", server.uri()), &transport).unwrap();

    let err = client.get_match("slow").await.unwrap_err();
    assert!(matches!(err, Error::Timeout { timeout_secs: 1 }), "got {err:?}");
    assert!(err.is_transient());
}
