//! Slack session: the persisted access token and the observer told about it

use crate::core::config::project_dirs;
use crate::core::events::{AppEvent, EventSender};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Durable home of the access token
pub trait TokenStore: Send + Sync {
    fn fetch_token(&self) -> Option<String>;
    fn save_token(&self, token: Option<&str>) -> Result<()>;
}

/// Token kept in memory only
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn fetch_token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn save_token(&self, token: Option<&str>) -> Result<()> {
        *self.token.lock() = token.map(str::to_string);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slack_token: Option<String>,
}

/// Token persisted as a small TOML file in the data directory
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store at the platform default location
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(project_dirs()?.data_dir().join("session.toml")))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<TokenFile> {
        if !self.path.exists() {
            return Ok(TokenFile::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {:?}", self.path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse session file: {:?}", self.path))
    }
}

impl TokenStore for FileTokenStore {
    fn fetch_token(&self) -> Option<String> {
        match self.read() {
            Ok(file) => file.slack_token,
            Err(e) => {
                error!("{:#}", e);
                None
            }
        }
    }

    fn save_token(&self, token: Option<&str>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create session directory: {:?}", parent))?;
        }

        let file = TokenFile {
            slack_token: token.map(str::to_string),
        };
        let content = toml::to_string_pretty(&file).context("Failed to serialize session")?;

        // Write then rename so a crash never leaves half a token behind
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write session file: {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace session file: {:?}", self.path))?;
        Ok(())
    }
}

/// Cached token backed by a [`TokenStore`], plus the single session observer.
///
/// Shared by the OAuth handler and the DND controller.
pub struct Session {
    store: Arc<dyn TokenStore>,
    token: Mutex<Option<String>>,
    observer: Mutex<Option<EventSender>>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            token: Mutex::new(None),
            observer: Mutex::new(None),
        }
    }

    /// Register the observer, reload the token from the store, and report
    /// the current logged-in state. Returns false if already attached.
    pub(crate) fn attach(&self, observer: EventSender) -> bool {
        {
            let mut slot = self.observer.lock();
            if slot.is_some() {
                return false;
            }
            *slot = Some(observer);
        }

        let token = self.store.fetch_token();
        let logged_in = token.is_some();
        *self.token.lock() = token;
        info!("Slack: session loaded, logged_in={}", logged_in);
        self.notify(AppEvent::SessionStateChanged { logged_in });
        true
    }

    pub(crate) fn detach(&self) -> bool {
        self.observer.lock().take().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.lock().is_some()
    }

    /// Replace the token (None clears it), persist it, and notify the observer
    pub fn save(&self, token: Option<String>) {
        let logged_in = token.is_some();
        {
            let mut cached = self.token.lock();
            if let Err(e) = self.store.save_token(token.as_deref()) {
                error!("Slack: failed to persist session: {:#}", e);
            }
            *cached = token;
        }
        self.notify(AppEvent::SessionStateChanged { logged_in });
    }

    /// Clear the token only if it is still `rejected`.
    ///
    /// A rejection can arrive after the user already logged in again.
    pub fn invalidate(&self, rejected: &str) -> bool {
        {
            let mut cached = self.token.lock();
            if cached.as_deref() != Some(rejected) {
                return false;
            }
            if let Err(e) = self.store.save_token(None) {
                error!("Slack: failed to persist session: {:#}", e);
            }
            *cached = None;
        }
        info!("Slack: token rejected, session cleared");
        self.notify(AppEvent::SessionStateChanged { logged_in: false });
        true
    }

    pub(crate) fn notify(&self, event: AppEvent) {
        if let Some(observer) = self.observer.lock().as_ref() {
            let _ = observer.send(event);
        }
    }
}
