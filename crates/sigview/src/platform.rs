//! Collaborator factory and build capabilities

use crate::context::{ContextError, ContextHandle};
use crate::decoder::DecoderEngine;
use crate::window::{MainWindow, WindowContext, WindowError};
use std::path::PathBuf;

/// Optional subsystems compiled into this build
///
/// Resolved once at startup; nothing re-checks them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub decode: bool,
    pub signals: bool,
    pub crash_dump: bool,
}

impl Capabilities {
    /// Capabilities selected by cargo features
    pub fn from_build() -> Self {
        Self {
            decode: cfg!(feature = "decode"),
            signals: cfg!(feature = "signals"),
            crash_dump: cfg!(all(unix, feature = "stacktrace")),
        }
    }

    /// No optional subsystem
    pub fn none() -> Self {
        Self {
            decode: false,
            signals: false,
            crash_dump: false,
        }
    }

    pub fn failure_capture(&self) -> FailureCapture {
        if self.crash_dump {
            FailureCapture::CrashDump
        } else {
            FailureCapture::CatchPanics
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::from_build()
    }
}

/// How runtime failures are captured around the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCapture {
    /// Unwind to the outcome boundary and log the panic
    CatchPanics,
    /// Abort into the crash-dump handler; panics are not caught
    CrashDump,
}

/// Creates the collaborators the launcher orchestrates
pub trait Platform {
    /// Create the acquisition context; failure is fatal
    fn create_context(&mut self) -> Result<ContextHandle, ContextError>;

    /// The decoder engine, when this platform provides one
    fn decoder_engine(&mut self) -> Option<Box<dyn DecoderEngine>>;

    /// Construct the main window
    fn create_window(&mut self, ctx: WindowContext) -> Result<Box<dyn MainWindow>, WindowError>;

    /// Location of the persisted settings; `None` keeps them in memory
    fn settings_path(&self) -> Option<PathBuf>;

    /// Directory for the crash dump
    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_capture_never_combined() {
        let mut caps = Capabilities::none();
        assert_eq!(caps.failure_capture(), FailureCapture::CatchPanics);
        caps.crash_dump = true;
        assert_eq!(caps.failure_capture(), FailureCapture::CrashDump);
    }

    #[test]
    fn test_build_capabilities_follow_features() {
        let caps = Capabilities::from_build();
        assert_eq!(caps.decode, cfg!(feature = "decode"));
        assert_eq!(caps.signals, cfg!(feature = "signals"));
        assert_eq!(Capabilities::default(), caps);
    }
}
