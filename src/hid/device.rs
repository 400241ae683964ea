//! HID device discovery and output for the Luxafor light

use super::protocol::LightReport;
use crate::core::config::LightConfig;
use crate::light::color::LightColor;
use anyhow::{Context, Result};
use hidapi::{HidApi, HidDevice};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failure writing to the light
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("light not connected")]
    NotConnected,
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}

/// Output side of the status light.
///
/// Implementations are shared between the caller and the connectivity
/// pump, so writes take `&self`.
pub trait LightDevice: Send + Sync {
    /// Whether the device is currently attached and open
    fn is_connected(&self) -> bool;

    /// Show a color (brightness already applied)
    fn set_color(&self, color: LightColor) -> Result<(), DeviceError>;

    /// Set the fade speed used by subsequent color changes.
    ///
    /// Held by the open device only; a reconnected device starts from zero.
    fn set_transition_speed(&self, speed: i8) -> Result<(), DeviceError>;
}

/// An opened device handle plus the settings that live with it
struct OpenLight {
    handle: HidDevice,
    transition_speed: i8,
}

/// Luxafor light accessed through hidapi
#[derive(Clone)]
pub struct HidLight {
    /// HID API instance
    api: Arc<Mutex<HidApi>>,
    /// Opened device (if any)
    device: Arc<Mutex<Option<OpenLight>>>,
    /// Whether currently connected
    connected: Arc<AtomicBool>,
    vendor_id: u16,
    product_id: u16,
}

impl HidLight {
    /// Create a new light handle; no device is opened until the link monitor finds one
    pub fn new(config: &LightConfig) -> Result<Self> {
        let api = HidApi::new().context("Failed to initialize HID API")?;

        Ok(Self {
            api: Arc::new(Mutex::new(api)),
            device: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            vendor_id: config.vendor_id,
            product_id: config.product_id,
        })
    }

    /// Refresh the device list and reconcile the open handle with it.
    ///
    /// Returns the new connection state when it changed.
    pub(crate) fn poll(&self) -> Option<bool> {
        let present = {
            let mut api = self.api.lock();
            if let Err(e) = api.refresh_devices() {
                debug!("Failed to refresh device list: {}", e);
                return None;
            }
            let found = api
                .device_list()
                .any(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id);
            found
        };

        let connected = self.connected.load(Ordering::SeqCst);
        match (present, connected) {
            (true, false) => self.open().then_some(true),
            (false, true) => {
                self.close();
                Some(false)
            }
            _ => None,
        }
    }

    /// Open the device and mark it connected
    fn open(&self) -> bool {
        let api = self.api.lock();
        match api.open(self.vendor_id, self.product_id) {
            Ok(handle) => {
                if let Err(e) = handle.set_blocking_mode(false) {
                    warn!("Failed to set non-blocking mode: {}", e);
                    return false;
                }
                info!(
                    "Opened light (VID: 0x{:04X}, PID: 0x{:04X})",
                    self.vendor_id, self.product_id
                );
                *self.device.lock() = Some(OpenLight {
                    handle,
                    transition_speed: 0,
                });
                self.connected.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                debug!("Failed to open light: {}", e);
                false
            }
        }
    }

    /// Drop the device handle and mark it disconnected
    pub(crate) fn close(&self) {
        if self.device.lock().take().is_some() {
            info!("Light removed");
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    fn write(&self, report: &LightReport) -> Result<(), DeviceError> {
        let guard = self.device.lock();
        let device = guard.as_ref().ok_or(DeviceError::NotConnected)?;
        let written = device.handle.write(&report.to_wire())?;
        debug!("Wrote {} bytes to light", written);
        Ok(())
    }
}

impl LightDevice for HidLight {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_color(&self, color: LightColor) -> Result<(), DeviceError> {
        let speed = self
            .device
            .lock()
            .as_ref()
            .map(|d| d.transition_speed)
            .ok_or(DeviceError::NotConnected)?;
        self.write(&LightReport::color(color, speed))
    }

    fn set_transition_speed(&self, speed: i8) -> Result<(), DeviceError> {
        let mut guard = self.device.lock();
        let device = guard.as_mut().ok_or(DeviceError::NotConnected)?;
        device.transition_speed = speed;
        Ok(())
    }
}
