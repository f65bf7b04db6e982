//! Errors surfacing at the launcher's outcome boundary

use crate::context::ContextError;
use crate::device::DeviceError;
use crate::window::WindowError;

/// Failure of a launch stage
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("Panic: {0}")]
    Panic(String),
}

impl LaunchError {
    /// Build from a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        LaunchError::Panic(message)
    }
}
