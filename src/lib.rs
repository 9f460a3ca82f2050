//! # battery-osc
//!
//! Periodically reads battery telemetry from tracked hardware devices and
//! broadcasts each slot's battery *depletion* as a normalized float over
//! OSC/UDP — the shape an avatar/animation front-end (e.g. VRChat) expects
//! for float parameters.
//!
//! The pipeline: a two-phase scheduler (one warm-up tick, then a steady
//! period) drives snapshot builds against an abstract device registry; the
//! broadcast engine resolves the operator's slot assignments against the
//! latest snapshot and fires one message per resolved slot.
//!
//! ## Crate Structure
//!
//! - **`app`**: the controller loop owning all mutable state; serializes
//!   scheduler ticks and UI events on one task. Start here.
//! - **`broadcast`**: slot table + snapshot → outbound float parameters.
//! - **`config`**: layered figment configuration (`defaults → TOML → env`).
//! - **`error`**: the [`error::BatteryOscError`] taxonomy.
//! - **`logging`**: tracing subscriber bootstrap.
//! - **`mock`**: scripted registry and recording sender for tests and the
//!   demo binary.
//! - **`osc`**: minimal OSC 1.0 float-message encoder.
//! - **`registry`**: the consumed [`registry::DeviceRegistry`] trait.
//! - **`sender`**: the consumed [`sender::ParameterSender`] trait and its
//!   UDP implementation.
//! - **`slots`**: slot table and the two-click assignment state machine.
//! - **`snapshot`**: device snapshot building.

pub mod app;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock;
pub mod osc;
pub mod registry;
pub mod sender;
pub mod slots;
pub mod snapshot;

pub use app::{App, AppHandle, UiEvent};
pub use config::AppConfig;
pub use error::{AppResult, BatteryOscError};
pub use registry::DeviceRegistry;
pub use sender::ParameterSender;
