//! Light module - Color model and the light state machine

pub mod color;
mod controller;

pub use color::{LightColor, BRIGHTNESS_DIMMED, BRIGHTNESS_NORMAL};
pub use controller::{DesiredLightState, LightController, LightError};
