//! OS termination signals mapped to a graceful close of the main window
//!
//! SIGINT, SIGTERM and SIGHUP (Ctrl+C and console close on Windows) are
//! routed through `ctrlc`, whose handler thread posts the close request.
//! Nothing else runs in signal context.

use crate::window::{CloseHandle, CloseReason};

/// Marker for the installed process-wide signal handler
#[derive(Debug)]
pub struct SignalHandler;

impl SignalHandler {
    /// Install the handler, forwarding termination signals to `close`
    ///
    /// Only one handler can be installed per process.
    pub fn prepare(close: CloseHandle) -> Result<Self, SignalError> {
        ctrlc::set_handler(move || {
            log::info!("Received termination signal, closing main window");
            close.request_close(CloseReason::Signal);
        })
        .map_err(|e| match e {
            ctrlc::Error::MultipleHandlers => SignalError::AlreadyInstalled,
            other => SignalError::Install(other.to_string()),
        })?;

        log::debug!("Signal handler installed");
        Ok(SignalHandler)
    }
}

/// Signal handler installation errors
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Signal handler already installed")]
    AlreadyInstalled,

    #[error("Failed to install signal handler: {0}")]
    Install(String),
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::{raise, Signal};

    #[test]
    fn test_signal_requests_close_once_per_process() {
        let (handle, mut listener) = CloseHandle::channel();
        SignalHandler::prepare(handle.clone()).unwrap();

        raise(Signal::SIGTERM).unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let reason = runtime.block_on(async {
            tokio::time::timeout(std::time::Duration::from_secs(5), listener.wait()).await
        });
        assert_eq!(reason.unwrap(), Some(CloseReason::Signal));

        let (other, _listener) = CloseHandle::channel();
        assert!(matches!(
            SignalHandler::prepare(other),
            Err(SignalError::AlreadyInstalled)
        ));
    }
}
