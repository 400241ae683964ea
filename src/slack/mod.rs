//! Slack module - Web API client, session, OAuth handshake, and DND sync

mod api;
mod dnd;
mod oauth;
mod session;

pub use api::{OAuthExchangeRequest, OAuthGrant, SlackApi, SlackClient, SlackError};
pub use dnd::{DndController, DndError};
pub use oauth::{
    AuthError, AuthPhase, BrowserOpener, CallbackOutcome, OAuthHandler, SystemBrowser,
    CALLBACK_HOST, CALLBACK_PATH, MSG_CODE_NOT_FOUND, MSG_EXCHANGE_FAILED,
};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
