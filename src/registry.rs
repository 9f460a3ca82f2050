//! Device registry adapter trait.
//!
//! The device-tracking runtime (OpenVR-style) is an external collaborator.
//! This crate consumes it through a narrow capability trait: enumerate the
//! currently addressable device indices, then read battery, display name,
//! and serial per index. Real deployments implement this over their tracking
//! runtime; tests and the demo binary use [`crate::mock::MockDeviceRegistry`].
//!
//! # Contract
//!
//! - `device_indices` owns the index range. The bound on how many devices
//!   can exist is a property of the external runtime, not of this crate, so
//!   adapters enumerate instead of exposing a fixed maximum.
//! - A `None` battery reading is the "unavailable" sentinel: the device has
//!   no valid battery telemetry right now and must be skipped entirely.
//!   Adapters that get a raw negative value from their backend report `None`.
//! - A registry with no active session reports an empty index list; that is
//!   the normal steady state, not an error.

use crate::error::AppResult;
use async_trait::async_trait;

/// Read access to the external device-tracking runtime.
///
/// All methods are prompt reads; callers bound them defensively with a
/// timeout since the runtime is an external service that could hang.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Enumerate the currently addressable device indices.
    ///
    /// An inactive session yields an empty list.
    async fn device_indices(&self) -> AppResult<Vec<u32>>;

    /// Battery charge fraction in `[0, 1]` for the device at `index`,
    /// or `None` if no valid reading is available.
    async fn battery_fraction(&self, index: u32) -> AppResult<Option<f32>>;

    /// Human-readable model name for the device at `index`, if known.
    async fn display_name(&self, index: u32) -> AppResult<Option<String>>;

    /// Unique hardware serial for the device at `index`, if known.
    ///
    /// A device without a serial is not addressable and is skipped.
    async fn serial_id(&self, index: u32) -> AppResult<Option<String>>;
}
