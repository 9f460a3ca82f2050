//! Device snapshot building.
//!
//! A [`Snapshot`] is the complete, atomically-replaced list of enumerable
//! devices and their battery levels at one tick. The builder is a pure read
//! of the registry: devices without a valid battery reading or serial are
//! skipped, duplicate serials are dropped (first occurrence wins), and a
//! registry failure downgrades to an empty snapshot for the tick.

use crate::registry::DeviceRegistry;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Upper bound on any single registry call. The registry is an external
/// service; a hung call must not stall the tick loop.
const REGISTRY_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// One tracked device as observed at snapshot time.
///
/// Ephemeral: rebuilt wholly on every snapshot. Identity is equality of `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Unique hardware serial.
    pub id: String,
    /// Human-readable model name (falls back to the serial when absent).
    pub display_name: String,
    /// Battery charge fraction in `[0, 1]`.
    pub battery_fraction: f32,
}

/// Ordered, deduplicated device list for one instant.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    devices: Vec<Device>,
}

impl Snapshot {
    /// Build a snapshot from an already-collected device list,
    /// deduplicating by serial (first occurrence wins).
    pub fn from_devices(devices: Vec<Device>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(devices.len());
        let devices = devices
            .into_iter()
            .filter(|d| seen.insert(d.id.clone()))
            .collect();
        Self { devices }
    }

    /// Devices in enumeration order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Look up a device by serial.
    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Number of devices in the snapshot.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True when no devices were enumerable.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Builds fresh snapshots from the device registry.
pub struct SnapshotBuilder {
    registry: Arc<dyn DeviceRegistry>,
}

impl SnapshotBuilder {
    /// Create a builder over the given registry adapter.
    pub fn new(registry: Arc<dyn DeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Query the registry and produce the snapshot for this instant.
    ///
    /// Infallible by design: registry errors and timeouts are logged and
    /// collapse to an empty (or partial) snapshot, which resolves every
    /// assigned slot as unreachable for this tick. Absence of devices is the
    /// normal steady state for empty hardware slots.
    pub async fn build(&self) -> Snapshot {
        let indices = match timeout(REGISTRY_CALL_TIMEOUT, self.registry.device_indices()).await {
            Ok(Ok(indices)) => indices,
            Ok(Err(e)) => {
                warn!(error = %e, "device enumeration failed; snapshot is empty this tick");
                return Snapshot::default();
            }
            Err(_) => {
                warn!("device enumeration timed out; snapshot is empty this tick");
                return Snapshot::default();
            }
        };

        let mut devices = Vec::with_capacity(indices.len());
        for index in indices {
            if let Some(device) = self.read_device(index).await {
                devices.push(device);
            }
        }
        Snapshot::from_devices(devices)
    }

    /// Read one device, skipping it on any missing reading.
    ///
    /// The battery fraction is read first; without a valid reading the name
    /// and serial are never queried and the index contributes nothing.
    async fn read_device(&self, index: u32) -> Option<Device> {
        let battery = match timeout(REGISTRY_CALL_TIMEOUT, self.registry.battery_fraction(index))
            .await
        {
            Ok(Ok(Some(fraction))) if fraction >= 0.0 => fraction.min(1.0),
            Ok(Ok(_)) => return None,
            Ok(Err(e)) => {
                debug!(index, error = %e, "battery read failed; skipping device");
                return None;
            }
            Err(_) => {
                warn!(index, "battery read timed out; skipping device");
                return None;
            }
        };

        let id = match timeout(REGISTRY_CALL_TIMEOUT, self.registry.serial_id(index)).await {
            Ok(Ok(Some(id))) if !id.is_empty() => id,
            Ok(Ok(_)) => return None,
            Ok(Err(e)) => {
                debug!(index, error = %e, "serial read failed; skipping device");
                return None;
            }
            Err(_) => {
                warn!(index, "serial read timed out; skipping device");
                return None;
            }
        };

        let display_name = match timeout(REGISTRY_CALL_TIMEOUT, self.registry.display_name(index))
            .await
        {
            Ok(Ok(Some(name))) if !name.is_empty() => name,
            _ => id.clone(),
        };

        debug!(
            index,
            device_id = %id,
            battery_pct = (battery * 100.0).round() as u64,
            "enumerated device"
        );

        Some(Device {
            id,
            display_name,
            battery_fraction: battery,
        })
    }
}
