//! Do Not Disturb sync
//!
//! Turns snooze toggles into `dnd.setSnooze` / `dnd.endSnooze` requests and
//! tracks what Slack last confirmed. Requests run in the background; the
//! outcome lands in [`DndController::snooze_state`] and, for rejected
//! tokens, on the session observer.

use super::api::{SlackApi, SlackError};
use super::session::Session;
use crate::core::config::SlackConfig;
use crate::core::events::EventSender;
use crate::core::state::DndSnoozeState;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DndError {
    #[error("Slack controller already attached")]
    AlreadyAttached,
}

#[derive(Debug, Default)]
struct SnoozeTracker {
    /// Last value handed to `set_snoozed` that produced a request
    requested: Option<bool>,
    confirmed: DndSnoozeState,
    /// Sequence number of the latest request issued
    sequence: u64,
}

struct Inner {
    api: Arc<dyn SlackApi>,
    session: Arc<Session>,
    tracker: Mutex<SnoozeTracker>,
    snooze_minutes: u32,
}

impl Inner {
    async fn send(&self, snoozed: bool, token: &str) -> Result<(), SlackError> {
        if snoozed {
            self.api.set_snooze(token, self.snooze_minutes).await
        } else {
            self.api.end_snooze(token).await
        }
    }

    fn complete(&self, sequence: u64, snoozed: bool, token: &str, result: Result<(), SlackError>) {
        if let Err(e) = &result {
            if e.is_auth_failure() {
                self.session.invalidate(token);
            }
        }

        let mut tracker = self.tracker.lock();
        if tracker.sequence != sequence {
            debug!(
                "Slack: ignoring stale response #{} (latest #{})",
                sequence, tracker.sequence
            );
            return;
        }

        tracker.confirmed = match result {
            Ok(()) => {
                info!("Slack: snoozed={} confirmed", snoozed);
                DndSnoozeState::confirmed(snoozed)
            }
            Err(e) => {
                warn!("Slack: snoozed={} failed: {}", snoozed, e);
                DndSnoozeState::Unknown
            }
        };
    }
}

/// Mirrors the desired snooze state to Slack
pub struct DndController {
    inner: Arc<Inner>,
}

impl DndController {
    pub fn new(api: Arc<dyn SlackApi>, session: Arc<Session>, config: &SlackConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                session,
                tracker: Mutex::new(SnoozeTracker::default()),
                snooze_minutes: config.snooze_minutes,
            }),
        }
    }

    /// Load the token and report the current logged-in state to `observer`
    pub fn attach(&self, observer: EventSender) -> Result<(), DndError> {
        if !self.inner.session.attach(observer) {
            warn!("Slack: controller already attached");
            return Err(DndError::AlreadyAttached);
        }
        Ok(())
    }

    /// Drop the observer. No-op if not attached.
    pub fn detach(&self) {
        if self.inner.session.detach() {
            info!("Slack: detached");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.session.is_logged_in()
    }

    /// Forget the token. The caller is expected to have confirmed with the user.
    pub fn remove_integration(&self) {
        info!("Slack: removing integration");
        self.inner.session.save(None);
    }

    /// Last state Slack confirmed
    pub fn snooze_state(&self) -> DndSnoozeState {
        self.inner.tracker.lock().confirmed
    }

    /// Last value that produced a request
    pub fn requested(&self) -> Option<bool> {
        self.inner.tracker.lock().requested
    }

    /// Request snooze on or off.
    ///
    /// Suppressed when `snoozed` equals the last *requested* value, even if
    /// that request failed. Returns the background request, if one was issued.
    pub fn set_snoozed(&self, snoozed: bool) -> Option<JoinHandle<()>> {
        let Some(token) = self.inner.session.token() else {
            debug!("Slack: not logged in, ignoring snoozed={}", snoozed);
            return None;
        };

        let sequence = {
            let mut tracker = self.inner.tracker.lock();
            if tracker.requested == Some(snoozed) {
                debug!("Slack: snoozed={} already requested", snoozed);
                return None;
            }
            tracker.requested = Some(snoozed);
            tracker.sequence += 1;
            tracker.sequence
        };

        info!("Slack: requesting snoozed={} (#{})", snoozed, sequence);
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            let result = inner.send(snoozed, &token).await;
            inner.complete(sequence, snoozed, &token, result);
        }))
    }
}
