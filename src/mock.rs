//! Mock collaborators for tests and for running the binary without a real
//! device-tracking runtime.
//!
//! [`MockDeviceRegistry`] scripts a device population that tests (or the
//! demo loop) mutate mid-run: batteries drain, devices vanish, the session
//! drops. [`RecordingSender`] captures outbound parameters instead of
//! touching the network.

use crate::error::{AppResult, BatteryOscError};
use crate::registry::DeviceRegistry;
use crate::sender::ParameterSender;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// One scripted device in the mock registry.
#[derive(Debug, Clone)]
struct MockDevice {
    index: u32,
    serial: Option<String>,
    name: Option<String>,
    /// Raw battery reading; `None` or a negative value means "unavailable".
    battery: Option<f32>,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<MockDevice>,
    session_inactive: bool,
    fail_next_enumeration: bool,
    call_delay: Option<Duration>,
}

/// Scripted [`DeviceRegistry`] implementation.
///
/// Clones share state, so a test can hold one handle while the app under
/// test polls another.
#[derive(Clone, Default)]
pub struct MockDeviceRegistry {
    state: Arc<Mutex<MockState>>,
}

impl MockDeviceRegistry {
    /// Create an empty registry with an active session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `count` fully-charged devices
    /// (`SIM-000`, `SIM-001`, ...).
    pub fn simulated(count: usize) -> Self {
        let registry = Self::new();
        for i in 0..count {
            registry.add_device(
                i as u32,
                &format!("SIM-{:03}", i),
                &format!("Simulated Tracker {}", i),
                Some(1.0),
            );
        }
        registry
    }

    /// Add a device with a serial and display name.
    pub fn add_device(&self, index: u32, serial: &str, name: &str, battery: Option<f32>) {
        self.add_device_raw(index, Some(serial), Some(name), battery);
    }

    /// Add a device where serial or name may be absent.
    pub fn add_device_raw(
        &self,
        index: u32,
        serial: Option<&str>,
        name: Option<&str>,
        battery: Option<f32>,
    ) {
        self.state.lock().devices.push(MockDevice {
            index,
            serial: serial.map(str::to_string),
            name: name.map(str::to_string),
            battery,
        });
    }

    /// Update a device's battery reading by serial. `None` makes the
    /// reading unavailable.
    pub fn set_battery(&self, serial: &str, battery: Option<f32>) {
        let mut state = self.state.lock();
        for device in &mut state.devices {
            if device.serial.as_deref() == Some(serial) {
                device.battery = battery;
            }
        }
    }

    /// Remove a device entirely, as if it powered off.
    pub fn remove_device(&self, serial: &str) {
        self.state
            .lock()
            .devices
            .retain(|d| d.serial.as_deref() != Some(serial));
    }

    /// Toggle the tracking session. An inactive session enumerates nothing.
    pub fn set_session_active(&self, active: bool) {
        self.state.lock().session_inactive = !active;
    }

    /// Make the next enumeration call fail once.
    pub fn fail_next_enumeration(&self) {
        self.state.lock().fail_next_enumeration = true;
    }

    /// Delay every registry call, to simulate a hung external service.
    pub fn set_call_delay(&self, delay: Duration) {
        self.state.lock().call_delay = Some(delay);
    }

    /// Drain every battery by roughly `step` with a little jitter, clamped
    /// at zero. Drives the demo mode of the binary.
    pub fn drain_batteries(&self, step: f32) {
        if step <= 0.0 {
            return;
        }
        let mut rng = rand::thread_rng();
        let mut state = self.state.lock();
        for device in &mut state.devices {
            if let Some(battery) = device.battery.as_mut() {
                let jitter: f32 = rng.gen_range(0.0..step * 0.5);
                *battery = (*battery - step - jitter).max(0.0);
            }
        }
    }

    fn device(&self, index: u32) -> Option<MockDevice> {
        let state = self.state.lock();
        if state.session_inactive {
            return None;
        }
        state.devices.iter().find(|d| d.index == index).cloned()
    }

    async fn simulate_latency(&self) {
        let delay = self.state.lock().call_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DeviceRegistry for MockDeviceRegistry {
    async fn device_indices(&self) -> AppResult<Vec<u32>> {
        self.simulate_latency().await;
        let mut state = self.state.lock();
        if state.fail_next_enumeration {
            state.fail_next_enumeration = false;
            return Err(BatteryOscError::Registry("injected enumeration failure".into()));
        }
        if state.session_inactive {
            return Ok(Vec::new());
        }
        Ok(state.devices.iter().map(|d| d.index).collect())
    }

    async fn battery_fraction(&self, index: u32) -> AppResult<Option<f32>> {
        self.simulate_latency().await;
        Ok(self
            .device(index)
            .and_then(|d| d.battery)
            .filter(|fraction| *fraction >= 0.0))
    }

    async fn display_name(&self, index: u32) -> AppResult<Option<String>> {
        self.simulate_latency().await;
        Ok(self.device(index).and_then(|d| d.name))
    }

    async fn serial_id(&self, index: u32) -> AppResult<Option<String>> {
        self.simulate_latency().await;
        Ok(self.device(index).and_then(|d| d.serial))
    }
}

/// [`ParameterSender`] double that records `(parameter, value)` pairs.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, f32)>>,
    fail_next: Mutex<bool>,
    fail_shutdown: Mutex<bool>,
    send_delay: Mutex<Option<Duration>>,
}

impl RecordingSender {
    /// Everything sent so far, in send order.
    pub fn sent(&self) -> Vec<(String, f32)> {
        self.sent.lock().clone()
    }

    /// Make the next send fail once with a transport error.
    pub fn fail_next_send(&self) {
        *self.fail_next.lock() = true;
    }

    /// Make `shutdown` fail with a transport error.
    pub fn fail_shutdown(&self) {
        *self.fail_shutdown.lock() = true;
    }

    /// Delay every send, to simulate a slow transport in timing tests.
    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock() = Some(delay);
    }
}

#[async_trait]
impl ParameterSender for RecordingSender {
    async fn send_float(&self, parameter: &str, value: f32) -> AppResult<()> {
        let delay = *self.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut fail = self.fail_next.lock();
        if *fail {
            *fail = false;
            return Err(BatteryOscError::Send {
                parameter: parameter.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected send failure"),
            });
        }
        drop(fail);
        self.sent.lock().push((parameter.to_string(), value));
        Ok(())
    }

    async fn shutdown(&self) -> AppResult<()> {
        if *self.fail_shutdown.lock() {
            return Err(BatteryOscError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected shutdown failure",
            )));
        }
        Ok(())
    }
}
