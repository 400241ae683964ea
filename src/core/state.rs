//! Application state management

use std::fmt;

/// Device connection state as reported by the link monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl DeviceConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, DeviceConnectionState::Connected)
    }
}

impl From<bool> for DeviceConnectionState {
    fn from(connected: bool) -> Self {
        if connected {
            DeviceConnectionState::Connected
        } else {
            DeviceConnectionState::Disconnected
        }
    }
}

/// Remote Do Not Disturb state as last confirmed by Slack.
///
/// `Unknown` whenever the outcome of the latest request could not be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DndSnoozeState {
    #[default]
    Unknown,
    Snoozed,
    NotSnoozed,
}

impl DndSnoozeState {
    /// State confirmed by a successful request for `snoozed`
    pub fn confirmed(snoozed: bool) -> Self {
        if snoozed {
            DndSnoozeState::Snoozed
        } else {
            DndSnoozeState::NotSnoozed
        }
    }
}

impl fmt::Display for DndSnoozeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DndSnoozeState::Unknown => write!(f, "unknown"),
            DndSnoozeState::Snoozed => write!(f, "snoozed"),
            DndSnoozeState::NotSnoozed => write!(f, "not snoozed"),
        }
    }
}
