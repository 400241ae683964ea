//! Application event definitions

use tokio::sync::mpsc;

/// Observer channel handed to the controllers on attach
pub type EventSender = mpsc::UnboundedSender<AppEvent>;

/// Events reported by the controllers to their single subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Light device attached or detached
    LightConnectivityChanged { connected: bool },

    /// Slack token became available or was cleared
    SessionStateChanged { logged_in: bool },

    /// OAuth exchange produced a token for the named workspace
    AuthorizationSucceeded { team_name: String },

    /// OAuth handshake failed; message is user-facing
    AuthorizationFailed { message: String },
}
