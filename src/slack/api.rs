//! Slack Web API client
//!
//! Only the three methods the integration needs. Every response is a JSON
//! object; an `error` field marks an application-level failure.

use crate::core::config::SlackConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

/// Error codes meaning the token is no longer usable
const AUTH_ERRORS: &[&str] = &["invalid_auth", "not_authed"];

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    /// Network failure, timeout, or a non-success HTTP status
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Response body was not the expected JSON object
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Well-formed response carrying an `error` code
    #[error("API error: {0}")]
    Api(String),
}

impl SlackError {
    /// Whether Slack rejected the token itself
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SlackError::Api(code) if AUTH_ERRORS.contains(&code.as_str()))
    }
}

/// Parameters of a one-time `oauth.access` exchange
#[derive(Clone)]
pub struct OAuthExchangeRequest {
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
    pub redirect_uri: String,
}

impl fmt::Debug for OAuthExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthExchangeRequest")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Successful `oauth.access` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OAuthGrant {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
}

/// Remote side of the integration
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `oauth.access`: trade an authorization code for a token
    async fn oauth_access(&self, request: &OAuthExchangeRequest) -> Result<OAuthGrant, SlackError>;

    /// `dnd.setSnooze`
    async fn set_snooze(&self, token: &str, num_minutes: u32) -> Result<(), SlackError>;

    /// `dnd.endSnooze`
    async fn end_snooze(&self, token: &str) -> Result<(), SlackError>;
}

/// reqwest-backed [`SlackApi`]
pub struct SlackClient {
    client: reqwest::Client,
    api_url: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            api_url: format!("{}/api", config.base_url.trim_end_matches('/')),
        })
    }

    async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<serde_json::Value, SlackError> {
        let url = format!("{}/{}", self.api_url, method);
        debug!("Slack: POST {}", method);

        let response = self
            .client
            .post(&url)
            .form(params)
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SlackError::Malformed(e.to_string()))?;

        if !body.is_object() {
            return Err(SlackError::Malformed(format!("{} returned a non-object body", method)));
        }

        if let Some(code) = body.get("error").and_then(|e| e.as_str()) {
            warn!("Slack: {} error={}", method, code);
            return Err(SlackError::Api(code.to_string()));
        }

        Ok(body)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn oauth_access(&self, request: &OAuthExchangeRequest) -> Result<OAuthGrant, SlackError> {
        let body = self
            .call(
                "oauth.access",
                &[
                    ("client_id", request.client_id.as_str()),
                    ("client_secret", request.client_secret.as_str()),
                    ("code", request.code.as_str()),
                    ("redirect_uri", request.redirect_uri.as_str()),
                ],
            )
            .await?;
        serde_json::from_value(body).map_err(|e| SlackError::Malformed(e.to_string()))
    }

    async fn set_snooze(&self, token: &str, num_minutes: u32) -> Result<(), SlackError> {
        let minutes = num_minutes.to_string();
        self.call("dnd.setSnooze", &[("token", token), ("num_minutes", minutes.as_str())])
            .await
            .map(|_| ())
    }

    async fn end_snooze(&self, token: &str) -> Result<(), SlackError> {
        self.call("dnd.endSnooze", &[("token", token)]).await.map(|_| ())
    }
}
