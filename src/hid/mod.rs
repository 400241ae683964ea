//! HID module - USB HID communication with the Luxafor light

mod device;
#[cfg(any(test, feature = "mock-hid"))]
pub mod mock;
mod monitor;
mod protocol;

pub use device::{DeviceError, HidLight, LightDevice};
pub use monitor::{HidLinkMonitor, LinkMonitor, MonitorError};
pub use protocol::{LightCommand, LightReport, REPORT_SIZE};
