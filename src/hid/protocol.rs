//! HID protocol definitions for the Luxafor Flag
//!
//! Output reports are 8 bytes:
//! - Byte 0: command
//! - Byte 1: LED selector (0xFF addresses every LED)
//! - Bytes 2-4: red, green, blue
//! - Byte 5: fade speed (fade command only)

use crate::light::color::LightColor;

/// Output report size in bytes
pub const REPORT_SIZE: usize = 8;

/// LED selector addressing both sides of the flag
pub const ALL_LEDS: u8 = 0xFF;

/// Commands supported by the Luxafor firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LightCommand {
    /// Switch immediately to a color
    Static = 0x01,
    /// Fade to a color at a given speed
    Fade = 0x02,
}

impl LightCommand {
    /// Convert command to byte value
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    /// Parse command from byte
    #[cfg(test)]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(LightCommand::Static),
            0x02 => Some(LightCommand::Fade),
            _ => None,
        }
    }
}

/// An 8-byte output report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightReport {
    data: [u8; REPORT_SIZE],
}

impl LightReport {
    /// Build the report that shows `color`.
    ///
    /// A non-zero transition speed selects the fade command; zero (or negative)
    /// switches instantly.
    pub fn color(color: LightColor, transition_speed: i8) -> Self {
        let mut data = [0u8; REPORT_SIZE];
        data[1] = ALL_LEDS;
        data[2] = color.red;
        data[3] = color.green;
        data[4] = color.blue;
        if transition_speed > 0 {
            data[0] = LightCommand::Fade.as_byte();
            data[5] = transition_speed as u8;
        } else {
            data[0] = LightCommand::Static.as_byte();
        }
        Self { data }
    }

    #[cfg(test)]
    pub fn command(&self) -> Option<LightCommand> {
        LightCommand::from_byte(self.data[0])
    }

    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.data
    }

    /// Bytes handed to `hid_write`.
    ///
    /// macOS and Windows expect the report ID (0) in front of the payload.
    pub fn to_wire(&self) -> Vec<u8> {
        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            let mut data = Vec::with_capacity(REPORT_SIZE + 1);
            data.push(0x00); // Report ID
            data.extend_from_slice(&self.data);
            data
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            self.data.to_vec()
        }
    }
}
