//! Device manager: driver discovery at startup

use crate::context::{ContextHandle, DeviceInfo, DriverOptions};
use std::collections::HashSet;
use std::fmt;

/// Parsed `--driver` value: `name[:key=value]*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSpec {
    pub driver: String,
    pub options: DriverOptions,
}

impl DriverSpec {
    /// Parse a driver spec string
    pub fn parse(spec: &str) -> Result<Self, DeviceError> {
        let mut parts = spec.split(':');
        let driver = parts.next().unwrap_or_default().trim();
        if driver.is_empty() {
            return Err(DeviceError::InvalidSpec {
                spec: spec.to_string(),
                reason: "missing driver name".to_string(),
            });
        }

        let mut options = DriverOptions::new();
        for part in parts {
            let (key, value) = part.split_once('=').ok_or_else(|| DeviceError::InvalidSpec {
                spec: spec.to_string(),
                reason: format!("option '{}' is not key=value", part),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(DeviceError::InvalidSpec {
                    spec: spec.to_string(),
                    reason: format!("option '{}' has no key", part),
                });
            }
            options.insert(key.to_string(), value.trim().to_string());
        }

        Ok(Self {
            driver: driver.to_string(),
            options,
        })
    }
}

impl fmt::Display for DriverSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.driver)?;
        for (key, value) in &self.options {
            write!(f, ":{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Discovers and holds the available capture devices
pub struct DeviceManager {
    context: ContextHandle,
    devices: Vec<DeviceInfo>,
    user_device: Option<DeviceInfo>,
}

impl DeviceManager {
    /// Scan for devices
    ///
    /// With `scan` every driver is probed without options; scan failures
    /// are only logged. A driver spec is then scanned with its options and
    /// its first device becomes the user-selected device.
    pub fn new(
        context: ContextHandle,
        driver_spec: Option<&str>,
        scan: bool,
    ) -> Result<Self, DeviceError> {
        let spec = driver_spec.map(DriverSpec::parse).transpose()?;

        let mut manager = Self {
            context,
            devices: Vec::new(),
            user_device: None,
        };

        if scan {
            for driver in manager.context.drivers() {
                if spec.as_ref().is_some_and(|s| s.driver == driver) {
                    continue;
                }
                match manager.context.scan(&driver, &DriverOptions::new()) {
                    Ok(found) => manager.add_devices(found),
                    Err(e) => log::warn!("Scan of driver '{}' failed: {}", driver, e),
                }
            }
        }

        if let Some(spec) = spec {
            if !manager.context.drivers().contains(&spec.driver) {
                return Err(DeviceError::UnknownDriver(spec.driver));
            }
            let found = manager
                .context
                .scan(&spec.driver, &spec.options)
                .map_err(|e| DeviceError::Scan {
                    spec: spec.to_string(),
                    source: e,
                })?;
            match found.first() {
                Some(device) => {
                    log::info!("Selected device {}", device);
                    manager.user_device = Some(device.clone());
                }
                None => log::warn!("No device found for driver spec '{}'", spec),
            }
            manager.add_devices(found);
        }

        log::info!("Device manager found {} device(s)", manager.devices.len());
        Ok(manager)
    }

    fn add_devices(&mut self, found: Vec<DeviceInfo>) {
        let mut known: HashSet<(String, String)> = self
            .devices
            .iter()
            .map(|d| (d.driver.clone(), d.connection.clone()))
            .collect();
        for device in found {
            if known.insert((device.driver.clone(), device.connection.clone())) {
                log::debug!("Found {}", device);
                self.devices.push(device);
            }
        }
    }

    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Device chosen through the driver spec, if any
    pub fn user_device(&self) -> Option<&DeviceInfo> {
        self.user_device.as_ref()
    }
}

/// Device manager errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Invalid driver spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    #[error("Driver '{0}' not found")]
    UnknownDriver(String),

    #[error("Scan for '{spec}' failed: {source}")]
    Scan {
        spec: String,
        #[source]
        source: crate::context::ContextError,
    },
}
