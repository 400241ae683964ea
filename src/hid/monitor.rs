//! Attach/detach detection for the light
//!
//! A monitor reports `true`/`false` on its channel exactly once per physical
//! transition. Events are delivered from the monitor's own thread.

use super::device::HidLight;
use std::sync::mpsc::{self as std_mpsc, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// The platform watch could not be installed
#[derive(Debug, thiserror::Error)]
#[error("failed to start link monitor: {0}")]
pub struct MonitorError(pub String);

/// Source of connectivity transitions
pub trait LinkMonitor: Send {
    /// Begin watching; transitions are sent on `events`
    fn start(&mut self, events: mpsc::UnboundedSender<bool>) -> Result<(), MonitorError>;

    /// Stop watching. No-op if not started.
    ///
    /// The link is considered down afterwards, so a later `start` reports a
    /// light that is still plugged in as a fresh `true`.
    fn stop(&mut self);
}

/// Polling monitor backed by the hidapi device list
pub struct HidLinkMonitor {
    light: HidLight,
    poll_interval: Duration,
    /// Wakes the monitor thread out of its poll sleep to stop it
    stop_monitor: Option<std_mpsc::Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl HidLinkMonitor {
    pub fn new(light: HidLight, poll_interval: Duration) -> Self {
        Self {
            light,
            poll_interval,
            stop_monitor: None,
            thread_handle: None,
        }
    }
}

impl LinkMonitor for HidLinkMonitor {
    fn start(&mut self, events: mpsc::UnboundedSender<bool>) -> Result<(), MonitorError> {
        if self.thread_handle.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let light = self.light.clone();
        let poll_interval = self.poll_interval;

        let handle = thread::Builder::new()
            .name("light-monitor".to_string())
            .spawn(move || {
                info!("Light monitor thread started");
                loop {
                    if let Some(connected) = light.poll() {
                        debug!("Light link changed: connected={}", connected);
                        if events.send(connected).is_err() {
                            // Receiver gone, nobody left to tell
                            break;
                        }
                    }
                    match stop_rx.recv_timeout(poll_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("Light monitor thread stopped");
            })
            .map_err(|e| MonitorError(e.to_string()))?;

        self.stop_monitor = Some(stop_tx);
        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };
        if let Some(stop) = self.stop_monitor.take() {
            let _ = stop.send(());
        }
        // Returns after at most one in-flight poll
        let _ = handle.join();
        self.light.close();
    }
}

impl Drop for HidLinkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
