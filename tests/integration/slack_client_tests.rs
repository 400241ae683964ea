//! SlackClient request/response handling

use super::config_for;
use busylight::slack::{OAuthExchangeRequest, SlackApi, SlackClient, SlackError};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn exchange_request() -> OAuthExchangeRequest {
    OAuthExchangeRequest {
        client_id: "123.456".to_string(),
        client_secret: "s3cret".to_string(),
        code: "abc".to_string(),
        redirect_uri: "https://traversal.space/luxaforus/slack".to_string(),
    }
}

#[tokio::test]
async fn test_set_snooze_posts_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .and(body_string_contains("token=xoxp-1"))
        .and(body_string_contains("num_minutes=1440"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    let result = client.set_snooze("xoxp-1", 1440).await;
    assert!(result.is_ok(), "Expected Ok, got: {result:?}");
}

#[tokio::test]
async fn test_end_snooze_posts_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.endSnooze"))
        .and(body_string_contains("token=xoxp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    assert!(client.end_snooze("xoxp-1").await.is_ok());
}

#[tokio::test]
async fn test_oauth_access_returns_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth.access"))
        .and(body_string_contains("client_id=123.456"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("redirect_uri=https%3A%2F%2Ftraversal.space%2Fluxaforus%2Fslack"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "access_token": "xoxp-new",
            "team_name": "Acme"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    let grant = client
        .oauth_access(&exchange_request())
        .await
        .unwrap_or_else(|e| panic!("Expected Ok, got Err: {e}"));
    assert_eq!(grant.access_token.as_deref(), Some("xoxp-new"));
    assert_eq!(grant.team_name.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_error_field_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.endSnooze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "invalid_auth"})),
        )
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    match client.end_snooze("xoxp-1").await {
        Err(e @ SlackError::Api(_)) => assert!(e.is_auth_failure()),
        other => panic!("Expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    let result = client.set_snooze("xoxp-1", 1440).await;
    assert!(matches!(result, Err(SlackError::Transport(_))), "got: {result:?}");
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    let result = client.set_snooze("xoxp-1", 1440).await;
    assert!(matches!(result, Err(SlackError::Malformed(_))), "got: {result:?}");
}

#[tokio::test]
async fn test_non_object_json_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.endSnooze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    let result = client.end_snooze("xoxp-1").await;
    assert!(matches!(result, Err(SlackError::Malformed(_))), "got: {result:?}");
}

#[tokio::test]
async fn test_timeout_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = SlackClient::new(&config_for(&server)).unwrap();
    let result = client.set_snooze("xoxp-1", 1440).await;
    match result {
        Err(e @ SlackError::Transport(_)) => assert!(!e.is_auth_failure()),
        other => panic!("Expected Transport error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let config = busylight::core::config::SlackConfig {
        base_url: "http://127.0.0.1:59999".to_string(),
        request_timeout_secs: 1,
        ..Default::default()
    };
    let client = SlackClient::new(&config).unwrap();
    let result = client.end_snooze("xoxp-1").await;
    assert!(matches!(result, Err(SlackError::Transport(_))), "got: {result:?}");
}
