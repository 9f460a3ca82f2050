//! Custom error types for the application.
//!
//! This module defines the primary error type, [`BatteryOscError`], using the
//! `thiserror` crate so every failure path in the crate has a single, typed
//! home. Broadly, errors fall into two categories:
//!
//! - **Startup errors** (`Configuration`, `ConfigLoad`, `Io` during socket
//!   bind) — permanent, abort the process with a message.
//! - **Tick-time errors** (`Registry`, `Send`, `Encode`) — transient by
//!   design. The broadcast pipeline logs them and keeps ticking; a device
//!   that is unreachable this tick may well be back on the next one.
//!
//! Nothing in this system is user-fatal once the event loop is running.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, BatteryOscError>;

/// Primary error type for the battery broadcast service.
#[derive(Error, Debug)]
pub enum BatteryOscError {
    /// Configuration values parsed but failed semantic validation
    /// (zero slots, empty parameter prefix, unresolvable destination, ...).
    ///
    /// Permanent: fix the configuration and restart.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file or environment extraction failed.
    ///
    /// Wraps `figment::Error` from the layered config loader.
    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] figment::Error),

    /// Standard I/O operation failed (socket bind, file access).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device registry adapter reported a failure.
    ///
    /// Transient: the snapshot builder downgrades this to an empty snapshot
    /// for the current tick rather than letting it escape the tick.
    #[error("Device registry error: {0}")]
    Registry(String),

    /// An outbound parameter message could not be sent.
    ///
    /// Transient, fire-and-forget semantics: the broadcast engine logs the
    /// failure and continues with the remaining slots in the same tick.
    #[error("Failed to send parameter '{parameter}': {source}")]
    Send {
        /// Full OSC parameter address that failed to send.
        parameter: String,
        /// Underlying transport error.
        #[source]
        source: std::io::Error,
    },

    /// An OSC message could not be encoded (malformed address).
    #[error("OSC encoding error: {0}")]
    Encode(String),

    /// One or more resources failed to release during shutdown.
    ///
    /// Logged for diagnostics, never retried; shutdown proceeds regardless.
    #[error("Shutdown failed with errors")]
    ShutdownFailed(Vec<BatteryOscError>),
}
