//! DND sync end to end over HTTP

use super::config_for;
use busylight::slack::{DndController, MemoryTokenStore, Session, SlackApi, SlackClient, TokenStore};
use busylight::{AppEvent, DndSnoozeState};
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    store: Arc<MemoryTokenStore>,
    dnd: DndController,
    events: mpsc::UnboundedReceiver<AppEvent>,
}

fn harness(server: &MockServer, token: Option<&str>) -> Harness {
    let config = config_for(server);
    let store = Arc::new(MemoryTokenStore::new(token));
    let session = Arc::new(Session::new(Arc::clone(&store) as Arc<dyn TokenStore>));
    let api: Arc<dyn SlackApi> = Arc::new(SlackClient::new(&config).unwrap());
    let dnd = DndController::new(api, session, &config);
    let (tx, mut events) = mpsc::unbounded_channel();
    dnd.attach(tx).unwrap();
    assert_eq!(
        events.try_recv().ok(),
        Some(AppEvent::SessionStateChanged {
            logged_in: token.is_some()
        })
    );
    Harness { store, dnd, events }
}

fn ok_body() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true}))
}

fn error_body(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": false, "error": code}))
}

#[tokio::test]
async fn test_snooze_then_invalid_auth_on_end_snooze() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .respond_with(ok_body())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dnd.endSnooze"))
        .respond_with(error_body("invalid_auth"))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("xoxp-1"));
    assert_eq!(h.dnd.snooze_state(), DndSnoozeState::Unknown);

    h.dnd.set_snoozed(true).unwrap().await.unwrap();
    assert_eq!(h.dnd.snooze_state(), DndSnoozeState::Snoozed);
    assert!(h.events.try_recv().is_err());

    assert!(h.dnd.set_snoozed(true).is_none());

    h.dnd.set_snoozed(false).unwrap().await.unwrap();
    assert_eq!(h.store.fetch_token(), None);
    assert!(!h.dnd.is_logged_in());
    assert_eq!(
        h.events.try_recv().ok(),
        Some(AppEvent::SessionStateChanged { logged_in: false })
    );
    assert_eq!(h.dnd.snooze_state(), DndSnoozeState::Unknown);
}

#[tokio::test]
async fn test_transport_failure_keeps_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("xoxp-1"));
    h.dnd.set_snoozed(true).unwrap().await.unwrap();

    assert_eq!(h.dnd.snooze_state(), DndSnoozeState::Unknown);
    assert_eq!(h.store.fetch_token().as_deref(), Some("xoxp-1"));
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_not_authed_on_set_snooze_logs_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .respond_with(error_body("not_authed"))
        .mount(&server)
        .await;

    let mut h = harness(&server, Some("xoxp-1"));
    h.dnd.set_snoozed(true).unwrap().await.unwrap();

    assert!(!h.dnd.is_logged_in());
    assert_eq!(
        h.events.try_recv().ok(),
        Some(AppEvent::SessionStateChanged { logged_in: false })
    );
}

#[tokio::test]
async fn test_logged_out_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ok_body())
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server, None);
    assert!(h.dnd.set_snoozed(true).is_none());
    assert!(h.dnd.set_snoozed(false).is_none());
}
