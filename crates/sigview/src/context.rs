//! Acquisition context contract
//!
//! The acquisition context is the handle to the native driver layer. It is
//! created once and shared by the device manager, the main window and the
//! log-level setter.

use crate::config::LogLevel;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to the acquisition context
pub type ContextHandle = Arc<dyn AcquisitionContext>;

/// Driver options, as `key=value` pairs from a driver spec
pub type DriverOptions = BTreeMap<String, String>;

/// A device found by a driver scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub driver: String,
    pub vendor: String,
    pub model: String,
    pub connection: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) on {}",
            self.vendor, self.model, self.driver, self.connection
        )
    }
}

/// The native hardware/driver subsystem
pub trait AcquisitionContext: Send + Sync {
    /// Library name and version, for diagnostics
    fn description(&self) -> String;

    /// Set the driver-layer log verbosity
    fn set_log_level(&self, level: LogLevel);

    /// Current driver-layer log verbosity
    fn log_level(&self) -> LogLevel;

    /// Names of every available driver
    fn drivers(&self) -> Vec<String>;

    /// Scan one driver for devices
    fn scan(&self, driver: &str, options: &DriverOptions) -> Result<Vec<DeviceInfo>, ContextError>;
}

/// Acquisition context errors
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Failed to create acquisition context: {0}")]
    Init(String),

    #[error("Driver '{0}' not found")]
    UnknownDriver(String),

    #[error("Scan of driver '{driver}' failed: {reason}")]
    ScanFailed { driver: String, reason: String },
}
