//! Integration tests against a mock Slack Web API

mod dnd_tests;
mod oauth_tests;
mod slack_client_tests;

use busylight::core::config::SlackConfig;
use wiremock::MockServer;

/// Config pointing the client at `server` with test credentials
pub fn config_for(server: &MockServer) -> SlackConfig {
    SlackConfig {
        client_id: Some("123.456".to_string()),
        client_secret: Some("s3cret".to_string()),
        base_url: server.uri(),
        request_timeout_secs: 1,
        ..SlackConfig::default()
    }
}
