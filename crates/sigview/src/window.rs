//! Main window / session host contract
//!
//! The main window owns the sessions and runs the event loop. Other threads
//! (the signal handler) only reach it through a [`CloseHandle`].

use crate::config::GlobalSettings;
use crate::device::DeviceManager;
use crate::logging::LogBuffer;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Why the window was asked to close
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The user closed the window
    User,
    /// SIGINT, SIGTERM or SIGHUP
    Signal,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::User => write!(f, "user request"),
            CloseReason::Signal => write!(f, "termination signal"),
        }
    }
}

/// Thread-safe handle posting a close request to the main window
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: watch::Sender<Option<CloseReason>>,
}

impl CloseHandle {
    /// Create a handle and the listener the event loop waits on
    pub fn channel() -> (CloseHandle, CloseListener) {
        let (tx, rx) = watch::channel(None);
        (CloseHandle { tx }, CloseListener { rx })
    }

    /// Request a graceful close; the first reason is kept
    pub fn request_close(&self, reason: CloseReason) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }
}

/// Receiving side of a [`CloseHandle`]
#[derive(Debug)]
pub struct CloseListener {
    rx: watch::Receiver<Option<CloseReason>>,
}

impl CloseListener {
    /// Wait until a close is requested
    ///
    /// Resolves to `None` only if every handle was dropped without a request.
    pub async fn wait(&mut self) -> Option<CloseReason> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        }
    }
}

/// Everything the main window is constructed from
pub struct WindowContext {
    pub devices: DeviceManager,
    pub settings: GlobalSettings,
    /// History of the logging subsystem, absent when logging to stdout
    pub log: Option<LogBuffer>,
}

/// The GUI entry point
pub trait MainWindow {
    fn show(&mut self);

    /// Restore the sessions saved by the previous run, returning how many
    fn restore_sessions(&mut self) -> Result<usize, WindowError>;

    /// Open a file as a new session
    fn add_session_with_file(&mut self, path: &Path, format: Option<&str>) -> Result<(), WindowError>;

    /// Add an empty session
    fn add_default_session(&mut self) -> Result<(), WindowError>;

    /// Number of open sessions
    fn session_count(&self) -> usize;

    /// Handle other threads use to request a graceful close
    fn close_handle(&self) -> CloseHandle;

    /// Run the event loop until the window closes; returns the exit code
    fn exec(&mut self) -> Result<i32, WindowError>;
}

/// Main window errors
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to create main window: {0}")]
    Create(String),

    #[error("Failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Event loop failed: {0}")]
    EventLoop(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_close_reason_wins() {
        let (handle, mut listener) = CloseHandle::channel();
        handle.request_close(CloseReason::User);
        handle.request_close(CloseReason::Signal);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert_eq!(runtime.block_on(listener.wait()), Some(CloseReason::User));
    }

    #[test]
    fn test_close_from_another_thread() {
        let (handle, mut listener) = CloseHandle::channel();
        let remote = handle.clone();
        let thread = std::thread::spawn(move || remote.request_close(CloseReason::Signal));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let reason = runtime.block_on(listener.wait());
        thread.join().unwrap();
        assert_eq!(reason, Some(CloseReason::Signal));
    }

    #[test]
    fn test_wait_returns_none_when_handles_dropped() {
        let (handle, mut listener) = CloseHandle::channel();
        drop(handle);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert_eq!(runtime.block_on(listener.wait()), None);
    }
}
