//! Light state machine
//!
//! Keeps the desired color and brightness, writes them to the light while it
//! is connected, and replays them once a reconnected light has settled.

use super::color::{clamp_brightness, LightColor, BRIGHTNESS_NORMAL};
use crate::core::config::LightConfig;
use crate::core::events::{AppEvent, EventSender};
use crate::core::state::DeviceConnectionState;
use crate::hid::{LightDevice, LinkMonitor, MonitorError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LightError {
    #[error("light controller already attached")]
    AlreadyAttached,
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Last color and brightness requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DesiredLightState {
    pub color: Option<LightColor>,
    pub brightness: Option<f32>,
}

impl DesiredLightState {
    /// What the device should show, if a color was ever requested
    pub fn output(&self) -> Option<LightColor> {
        self.color
            .map(|color| color.scaled(self.brightness.unwrap_or(BRIGHTNESS_NORMAL)))
    }
}

struct Inner {
    device: Arc<dyn LightDevice>,
    /// Locked for the whole write so a replay cannot overtake a newer color
    desired: Mutex<DesiredLightState>,
    observer: Mutex<Option<EventSender>>,
    link: Mutex<DeviceConnectionState>,
    /// Bumped on every connectivity transition; a pending replay only runs
    /// if no transition happened during its settle delay
    generation: AtomicU64,
    /// Set once a connected light has been replayed; cleared by every
    /// transition. Only changed while `desired` is locked.
    settled: AtomicBool,
    settle_delay: Duration,
}

impl Inner {
    fn notify(&self, event: AppEvent) {
        if let Some(observer) = self.observer.lock().as_ref() {
            let _ = observer.send(event);
        }
    }

    /// Invalidate any pending replay and hold writes until the next one
    fn unsettle(&self) -> u64 {
        let _desired = self.desired.lock();
        self.settled.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether commands may go to the device right now
    fn ready(&self) -> bool {
        self.settled.load(Ordering::SeqCst) && self.device.is_connected()
    }

    fn connectivity_changed(self: &Arc<Self>, connected: bool) {
        let generation = self.unsettle();
        *self.link.lock() = DeviceConnectionState::from(connected);
        info!("Light: connected={}", connected);

        self.notify(AppEvent::LightConnectivityChanged { connected });

        if connected {
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(inner.settle_delay).await;
                inner.replay(generation);
            });
        }
    }

    fn replay(&self, generation: u64) {
        let desired = self.desired.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Light: replay superseded by a later transition");
            return;
        }
        self.settled.store(true, Ordering::SeqCst);
        if desired.color.is_some() {
            debug!("Light: replaying desired state");
            self.write(&desired);
        }
    }

    /// Write the desired state if the light is connected and settled;
    /// otherwise, and on failure, it is left for the next replay
    fn write(&self, desired: &DesiredLightState) {
        let Some(output) = desired.output() else {
            return;
        };
        if !self.ready() {
            debug!("Light: not ready, deferring {}", output);
            return;
        }
        if let Err(e) = self.device.set_color(output) {
            warn!("Light: failed to write color: {}", e);
        }
    }
}

/// Drives the status light from the caller's desired state
pub struct LightController {
    inner: Arc<Inner>,
    monitor: Mutex<Box<dyn LinkMonitor>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    normal_brightness: f32,
    dimmed_brightness: f32,
}

impl LightController {
    pub fn new(
        device: Arc<dyn LightDevice>,
        monitor: Box<dyn LinkMonitor>,
        config: &LightConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                device,
                desired: Mutex::new(DesiredLightState::default()),
                observer: Mutex::new(None),
                link: Mutex::new(DeviceConnectionState::Disconnected),
                generation: AtomicU64::new(0),
                settled: AtomicBool::new(false),
                settle_delay: config.settle_delay(),
            }),
            monitor: Mutex::new(monitor),
            pump: Mutex::new(None),
            normal_brightness: config.normal_brightness,
            dimmed_brightness: config.dimmed_brightness,
        }
    }

    /// Register the observer and start watching for the light.
    ///
    /// Must be called from within a Tokio runtime. A monitor failure is
    /// returned but leaves the controller attached, so `detach` still applies.
    pub fn attach(&self, observer: EventSender) -> Result<(), LightError> {
        {
            let mut slot = self.inner.observer.lock();
            if slot.is_some() {
                warn!("Light: controller already attached");
                return Err(LightError::AlreadyAttached);
            }
            *slot = Some(observer);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<bool>();
        let inner = Arc::clone(&self.inner);
        *self.pump.lock() = Some(tokio::spawn(async move {
            while let Some(connected) = rx.recv().await {
                inner.connectivity_changed(connected);
            }
        }));

        if let Err(e) = self.monitor.lock().start(tx) {
            warn!("Light: {}", e);
            return Err(e.into());
        }

        info!("Light: attached");
        Ok(())
    }

    /// Stop watching and drop the observer. No-op if not attached.
    pub fn detach(&self) {
        if self.inner.observer.lock().is_none() {
            return;
        }

        self.monitor.lock().stop();
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        // Cancels any replay still waiting out its settle delay
        self.inner.unsettle();
        *self.inner.link.lock() = DeviceConnectionState::Disconnected;
        *self.inner.observer.lock() = None;

        info!("Light: detached");
    }

    pub fn is_attached(&self) -> bool {
        self.inner.observer.lock().is_some()
    }

    /// Last connectivity reported by the monitor
    pub fn connection_state(&self) -> DeviceConnectionState {
        *self.inner.link.lock()
    }

    pub fn desired_state(&self) -> DesiredLightState {
        *self.inner.desired.lock()
    }

    /// Request a color; written now if the light is connected and settled,
    /// otherwise on the next replay
    pub fn set_color(&self, color: LightColor) {
        info!("Light: color={}", color);
        let mut desired = self.inner.desired.lock();
        desired.color = Some(color);
        self.inner.write(&desired);
    }

    /// Request a brightness in [0, 1]; re-applies the current color if there is one
    pub fn set_brightness(&self, brightness: f32) {
        let brightness = clamp_brightness(brightness);
        info!("Light: brightness={}", brightness);
        let mut desired = self.inner.desired.lock();
        desired.brightness = Some(brightness);
        if desired.color.is_some() {
            self.inner.write(&desired);
        }
    }

    pub fn set_dimmed(&self, dimmed: bool) {
        self.set_brightness(if dimmed {
            self.dimmed_brightness
        } else {
            self.normal_brightness
        });
    }

    /// Forwarded only while connected and settled; not remembered for replay
    pub fn set_transition_speed(&self, speed: i8) {
        info!("Light: transitionSpeed={}", speed);
        if !self.inner.ready() {
            debug!("Light: not ready, dropping transition speed");
            return;
        }
        if let Err(e) = self.inner.device.set_transition_speed(speed) {
            warn!("Light: failed to set transition speed: {}", e);
        }
    }
}

impl Drop for LightController {
    fn drop(&mut self) {
        self.detach();
    }
}
