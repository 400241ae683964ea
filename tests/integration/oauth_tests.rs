//! OAuth handshake end to end over HTTP

use super::config_for;
use busylight::slack::{
    BrowserOpener, CallbackOutcome, DndController, MemoryTokenStore, OAuthHandler, Session, SlackApi,
    SlackClient, TokenStore, MSG_CODE_NOT_FOUND, MSG_EXCHANGE_FAILED,
};
use busylight::AppEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALLBACK: &str = "luxaforus://slack/activate?code=abc";

struct NoBrowser;

impl BrowserOpener for NoBrowser {
    fn open(&self, _url: &Url) -> std::io::Result<()> {
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryTokenStore>,
    dnd: DndController,
    oauth: OAuthHandler,
    events: mpsc::UnboundedReceiver<AppEvent>,
}

fn harness(server: &MockServer) -> Harness {
    let config = config_for(server);
    let store = Arc::new(MemoryTokenStore::default());
    let session = Arc::new(Session::new(Arc::clone(&store) as Arc<dyn TokenStore>));
    let api: Arc<dyn SlackApi> = Arc::new(SlackClient::new(&config).unwrap());
    let dnd = DndController::new(Arc::clone(&api), Arc::clone(&session), &config);
    let oauth = OAuthHandler::new(api, session, Arc::new(NoBrowser), &config);
    let (tx, mut events) = mpsc::unbounded_channel();
    dnd.attach(tx).unwrap();
    let _ = events.try_recv();
    Harness {
        store,
        dnd,
        oauth,
        events,
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

async fn finish(outcome: CallbackOutcome) {
    match outcome {
        CallbackOutcome::Exchanging(handle) => handle.await.unwrap(),
        other => panic!("Expected an exchange, got {other:?}"),
    }
}

#[tokio::test]
async fn test_login_then_snooze() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth.access"))
        .and(body_string_contains("code=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "access_token": "xoxp-new",
            "team_name": "Acme"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dnd.setSnooze"))
        .and(body_string_contains("token=xoxp-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    h.oauth.begin_authorization().unwrap();
    finish(h.oauth.handle_redirect(CALLBACK)).await;

    assert_eq!(h.store.fetch_token().as_deref(), Some("xoxp-new"));
    assert_eq!(
        drain(&mut h.events),
        vec![
            AppEvent::SessionStateChanged { logged_in: true },
            AppEvent::AuthorizationSucceeded {
                team_name: "Acme".to_string()
            },
        ]
    );

    h.dnd.set_snoozed(true).unwrap().await.unwrap();
    assert_eq!(h.dnd.snooze_state(), busylight::DndSnoozeState::Snoozed);
}

#[tokio::test]
async fn test_grant_without_token_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth.access"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": true, "team_name": "Acme"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    finish(h.oauth.handle_redirect(CALLBACK)).await;

    assert_eq!(h.store.fetch_token(), None);
    assert!(!h.dnd.is_logged_in());
    assert_eq!(
        drain(&mut h.events),
        vec![
            AppEvent::SessionStateChanged { logged_in: false },
            AppEvent::AuthorizationFailed {
                message: MSG_EXCHANGE_FAILED.to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_rejected_code_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/oauth.access"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "invalid_code"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    finish(h.oauth.handle_redirect(CALLBACK)).await;

    assert_eq!(h.store.fetch_token(), None);
    assert_eq!(
        drain(&mut h.events).last(),
        Some(&AppEvent::AuthorizationFailed {
            message: MSG_EXCHANGE_FAILED.to_string()
        })
    );
}

#[tokio::test]
async fn test_callback_without_code_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut h = harness(&server);
    let outcome = h.oauth.handle_redirect("luxaforus://slack/activate");
    assert!(matches!(outcome, CallbackOutcome::Rejected));
    assert_eq!(
        drain(&mut h.events),
        vec![AppEvent::AuthorizationFailed {
            message: MSG_CODE_NOT_FOUND.to_string()
        }]
    );

    assert!(matches!(
        h.oauth.handle_redirect("https://example.com/activate?code=abc"),
        CallbackOutcome::Ignored
    ));
}
