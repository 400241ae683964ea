//! Slack OAuth handshake
//!
//! `begin_authorization` sends the user to Slack in the browser. Slack
//! redirects to the registered page, which bounces to
//! `<scheme>://slack/activate?code=...`; that URL is fed to
//! `handle_redirect`, which trades the code for a token exactly once.

use super::api::{OAuthExchangeRequest, OAuthGrant, SlackApi};
use super::session::Session;
use crate::core::config::SlackConfig;
use crate::core::events::AppEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Host of the activation callback
pub const CALLBACK_HOST: &str = "slack";

/// Path of the activation callback
pub const CALLBACK_PATH: &str = "/activate";

/// Reported when the callback carries no code
pub const MSG_CODE_NOT_FOUND: &str = "Activation code not found.";

/// Reported for every failed exchange
pub const MSG_EXCHANGE_FAILED: &str = "OAuth access request failed. Try again later.";

/// Team name reported when Slack leaves it out
const UNKNOWN_TEAM: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Slack client ID not configured")]
    MissingClientId,
    #[error("invalid authorization URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to open browser: {0}")]
    Browser(#[from] std::io::Error),
}

/// Opens the authorization page for the user
pub trait BrowserOpener: Send + Sync {
    fn open(&self, url: &Url) -> std::io::Result<()>;
}

/// Default system browser
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &Url) -> std::io::Result<()> {
        open::that(url.as_str())
    }
}

/// Where the handshake currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Idle,
    AwaitingCallback,
    Exchanging,
}

/// What became of a callback URL
#[derive(Debug)]
pub enum CallbackOutcome {
    /// Not an activation callback; left for other consumers
    Ignored,
    /// Activation callback that could not be used; failure reported
    Rejected,
    /// An exchange is already running
    Busy,
    /// Exchange started; resolves once the outcome is reported
    Exchanging(JoinHandle<()>),
}

struct Inner {
    api: Arc<dyn SlackApi>,
    session: Arc<Session>,
    phase: Mutex<AuthPhase>,
}

impl Inner {
    fn fail(&self, message: &str) {
        warn!("Slack: authentication failed: {}", message);
        self.session.notify(AppEvent::AuthorizationFailed {
            message: message.to_string(),
        });
    }

    /// The exchange did not produce a token: drop any partial session and report
    fn fail_exchange(&self) {
        self.session.save(None);
        self.fail(MSG_EXCHANGE_FAILED);
    }

    async fn exchange(&self, request: OAuthExchangeRequest) {
        let result = self.api.oauth_access(&request).await;
        *self.phase.lock() = AuthPhase::Idle;

        match result {
            Ok(OAuthGrant {
                access_token: Some(token),
                team_name,
            }) if !token.is_empty() => {
                info!("Slack: oauth.access success");
                self.session.save(Some(token));
                self.session.notify(AppEvent::AuthorizationSucceeded {
                    team_name: team_name.unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
                });
            }
            Ok(_) => {
                warn!("Slack: oauth.access returned no access token");
                self.fail_exchange();
            }
            Err(e) => {
                warn!("Slack: oauth.access failure: {}", e);
                self.fail_exchange();
            }
        }
    }
}

/// Drives the OAuth handshake and stores the resulting token in the session
pub struct OAuthHandler {
    inner: Arc<Inner>,
    browser: Arc<dyn BrowserOpener>,
    client_id: Option<String>,
    client_secret: Option<String>,
    authorize_url: String,
    redirect_uri: String,
    scope: String,
}

impl OAuthHandler {
    pub fn new(
        api: Arc<dyn SlackApi>,
        session: Arc<Session>,
        browser: Arc<dyn BrowserOpener>,
        config: &SlackConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                session,
                phase: Mutex::new(AuthPhase::Idle),
            }),
            browser,
            client_id: config.client_id.clone().filter(|id| !id.is_empty()),
            client_secret: config.client_secret.clone(),
            authorize_url: format!("{}/oauth/authorize", config.base_url.trim_end_matches('/')),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
        }
    }

    pub fn phase(&self) -> AuthPhase {
        *self.inner.phase.lock()
    }

    /// Build the authorization URL and open it in the browser
    pub fn begin_authorization(&self) -> Result<Url, AuthError> {
        let client_id = self.client_id.as_deref().ok_or(AuthError::MissingClientId)?;
        let url = Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", client_id),
                ("scope", self.scope.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
            ],
        )?;

        self.browser.open(&url)?;
        *self.inner.phase.lock() = AuthPhase::AwaitingCallback;
        info!("Slack: awaiting authorization callback");
        Ok(url)
    }

    /// Handle a URL delivered by the OS.
    ///
    /// Only `*://slack/activate` (case-insensitive) is ours; anything else is ignored.
    pub fn handle_redirect(&self, raw: &str) -> CallbackOutcome {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                debug!("Slack: ignoring unparsable URL: {}", e);
                return CallbackOutcome::Ignored;
            }
        };

        if !is_activation_callback(&url) {
            debug!("Slack: ignoring URL for another handler");
            return CallbackOutcome::Ignored;
        }

        let code = url
            .query_pairs()
            .find(|(name, _)| name == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty());

        match code {
            Some(code) => self.exchange_code(code),
            None => {
                let mut phase = self.inner.phase.lock();
                if *phase == AuthPhase::Exchanging {
                    return CallbackOutcome::Busy;
                }
                *phase = AuthPhase::Idle;
                drop(phase);
                self.inner.fail(MSG_CODE_NOT_FOUND);
                CallbackOutcome::Rejected
            }
        }
    }

    /// Trade an authorization code for a token. One attempt, no retry.
    pub fn exchange_code(&self, code: String) -> CallbackOutcome {
        let mut phase = self.inner.phase.lock();
        if *phase == AuthPhase::Exchanging {
            warn!("Slack: exchange already in progress, dropping callback");
            return CallbackOutcome::Busy;
        }

        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            *phase = AuthPhase::Idle;
            drop(phase);
            warn!("Slack: client credentials not configured");
            self.inner.fail_exchange();
            return CallbackOutcome::Rejected;
        };

        let request = OAuthExchangeRequest {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            code,
            redirect_uri: self.redirect_uri.clone(),
        };

        *phase = AuthPhase::Exchanging;
        drop(phase);

        info!("Slack: exchanging authorization code");
        let inner = Arc::clone(&self.inner);
        CallbackOutcome::Exchanging(tokio::spawn(async move {
            inner.exchange(request).await;
        }))
    }
}

fn is_activation_callback(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(CALLBACK_HOST))
        && url.path().eq_ignore_ascii_case(CALLBACK_PATH)
}
