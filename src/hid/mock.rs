//! In-memory light and link monitor for running without hardware

use super::device::{DeviceError, LightDevice};
use super::monitor::{LinkMonitor, MonitorError};
use crate::light::color::LightColor;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A write that reached the mock light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockWrite {
    Color(LightColor),
    TransitionSpeed(i8),
}

/// Light that records every successful write
#[derive(Default)]
pub struct MockLight {
    connected: AtomicBool,
    fail_writes: AtomicBool,
    writes: Mutex<Vec<MockWrite>>,
}

impl MockLight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Writes received so far
    pub fn writes(&self) -> Vec<MockWrite> {
        self.writes.lock().clone()
    }

    /// Colors received so far
    pub fn colors(&self) -> Vec<LightColor> {
        self.writes
            .lock()
            .iter()
            .filter_map(|w| match w {
                MockWrite::Color(c) => Some(*c),
                MockWrite::TransitionSpeed(_) => None,
            })
            .collect()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().clear();
    }

    /// Make writes fail as if the device vanished mid-write
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, write: MockWrite) -> Result<(), DeviceError> {
        if !self.connected.load(Ordering::SeqCst) || self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeviceError::NotConnected);
        }
        self.writes.lock().push(write);
        Ok(())
    }
}

impl LightDevice for MockLight {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_color(&self, color: LightColor) -> Result<(), DeviceError> {
        self.record(MockWrite::Color(color))
    }

    fn set_transition_speed(&self, speed: i8) -> Result<(), DeviceError> {
        self.record(MockWrite::TransitionSpeed(speed))
    }
}

/// Monitor driven by hand through [`MockLink`]
pub struct MockLinkMonitor {
    link: MockLink,
    fail_start: bool,
}

impl MockLinkMonitor {
    pub fn new(light: Arc<MockLight>) -> Self {
        Self {
            link: MockLink {
                light,
                events: Arc::new(Mutex::new(None)),
            },
            fail_start: false,
        }
    }

    /// Monitor whose `start` always fails
    pub fn failing(light: Arc<MockLight>) -> Self {
        Self {
            fail_start: true,
            ..Self::new(light)
        }
    }

    /// Handle used to plug and unplug the mock light
    pub fn link(&self) -> MockLink {
        self.link.clone()
    }
}

impl LinkMonitor for MockLinkMonitor {
    fn start(&mut self, events: mpsc::UnboundedSender<bool>) -> Result<(), MonitorError> {
        if self.fail_start {
            return Err(MonitorError("mock monitor refused to start".to_string()));
        }
        // A light left plugged in across stop/start is reported again
        if self.link.light.is_connected() {
            let _ = events.send(true);
        }
        *self.link.events.lock() = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        self.link.events.lock().take();
    }
}

/// Simulates physical attach/detach of a [`MockLight`]
#[derive(Clone)]
pub struct MockLink {
    light: Arc<MockLight>,
    events: Arc<Mutex<Option<mpsc::UnboundedSender<bool>>>>,
}

impl MockLink {
    pub fn plug(&self) {
        self.set_connected(true);
    }

    pub fn unplug(&self) {
        self.set_connected(false);
    }

    /// Whether a monitor is currently watching this link
    pub fn is_watched(&self) -> bool {
        self.events.lock().is_some()
    }

    /// Change the physical state; reports only actual transitions
    pub fn set_connected(&self, connected: bool) {
        let previous = self.light.connected.swap(connected, Ordering::SeqCst);
        if previous == connected {
            return;
        }
        if let Some(events) = self.events.lock().as_ref() {
            let _ = events.send(connected);
        }
    }
}
