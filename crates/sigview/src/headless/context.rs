//! Built-in acquisition context with virtual drivers

use crate::config::LogLevel;
use crate::context::{AcquisitionContext, ContextError, DeviceInfo, DriverOptions};
use std::sync::atomic::{AtomicU8, Ordering};

/// Always yields one virtual device
pub const DEMO_DRIVER: &str = "demo";

/// Yields one device on the `conn` option
pub const LOOPBACK_DRIVER: &str = "loopback";

/// Acquisition context backed by virtual drivers only
#[derive(Debug)]
pub struct DemoContext {
    level: AtomicU8,
}

impl DemoContext {
    pub fn new() -> Self {
        Self {
            level: AtomicU8::new(LogLevel::default().value()),
        }
    }
}

impl Default for DemoContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AcquisitionContext for DemoContext {
    fn description(&self) -> String {
        format!("{} demo acquisition {}", crate::TITLE, crate::VERSION)
    }

    fn set_log_level(&self, level: LogLevel) {
        self.level.store(level.value(), Ordering::Relaxed);
        log::debug!("Acquisition log level set to {}", level);
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::new(i64::from(self.level.load(Ordering::Relaxed))).unwrap_or_default()
    }

    fn drivers(&self) -> Vec<String> {
        vec![DEMO_DRIVER.to_string(), LOOPBACK_DRIVER.to_string()]
    }

    fn scan(&self, driver: &str, options: &DriverOptions) -> Result<Vec<DeviceInfo>, ContextError> {
        if self.log_level().allows(LogLevel::DEBUG) {
            log::debug!("Scanning driver '{}' with {} option(s)", driver, options.len());
        }

        match driver {
            DEMO_DRIVER => Ok(vec![DeviceInfo {
                driver: DEMO_DRIVER.to_string(),
                vendor: "Demo".to_string(),
                model: "device".to_string(),
                connection: "virtual".to_string(),
            }]),
            LOOPBACK_DRIVER => Ok(options
                .get("conn")
                .map(|conn| DeviceInfo {
                    driver: LOOPBACK_DRIVER.to_string(),
                    vendor: "Loopback".to_string(),
                    model: "probe".to_string(),
                    connection: conn.clone(),
                })
                .into_iter()
                .collect()),
            other => Err(ContextError::UnknownDriver(other.to_string())),
        }
    }
}
