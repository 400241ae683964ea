//! Busylight
//!
//! Drives a Luxafor USB status light and mirrors availability to Slack.
//!
//! # Features
//! - Replays the desired color and brightness whenever the light is plugged back in
//! - Snoozes and unsnoozes Slack notifications (Do Not Disturb)
//! - Slack OAuth handshake with the token persisted across restarts

pub mod cli;
pub mod core;
pub mod hid;
pub mod light;
pub mod slack;

pub use core::config::Config;
pub use core::events::AppEvent;
pub use core::state::{DeviceConnectionState, DndSnoozeState};
pub use light::{LightColor, LightController};
pub use slack::{DndController, OAuthHandler, Session};
