//! Light color model
//!
//! Brightness is kept apart from the color and only folded in when a value is
//! written to the device, so a brightness change can replay the last color.

use std::fmt;
use std::str::FromStr;

/// Brightness used when not dimmed
pub const BRIGHTNESS_NORMAL: f32 = 1.0;

/// Brightness used when dimmed
pub const BRIGHTNESS_DIMMED: f32 = 0.1;

/// RGB color of the light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl LightColor {
    /// Free to talk
    pub const AVAILABLE: LightColor = LightColor::rgb(0, 255, 0);
    /// Do not disturb
    pub const BUSY: LightColor = LightColor::rgb(255, 0, 0);
    /// Screen locked, light off
    pub const LOCKED: LightColor = LightColor::rgb(0, 0, 0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Color as written to the device at the given brightness
    pub fn scaled(&self, brightness: f32) -> LightColor {
        let factor = clamp_brightness(brightness);
        let scale = |channel: u8| (f32::from(channel) * factor).round() as u8;
        LightColor::rgb(scale(self.red), scale(self.green), scale(self.blue))
    }
}

/// Clamp a brightness value into [0, 1]; NaN counts as off
pub fn clamp_brightness(brightness: f32) -> f32 {
    if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 1.0)
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Error parsing a `RRGGBB` color
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}, expected RRGGBB")]
pub struct ParseColorError(String);

impl FromStr for LightColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(LightColor::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}
