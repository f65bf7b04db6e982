//! Crash dumps for low-level faults
//!
//! When installed, SIGSEGV and SIGABRT write the raw instruction pointers of
//! the faulting stack to a fixed file in the temp directory, then re-raise
//! the signal with the default disposition. The next run reports and removes
//! the dump.
//!
//! Dump format: native-endian `usize` instruction pointers, innermost first.

use std::path::{Path, PathBuf};

/// File name of the dump inside the temp directory
pub const DUMP_FILE_NAME: &str = "sigview_stacktrace.dmp";

/// Upper bound on captured frames
pub const MAX_FRAMES: usize = 128;

const WORD: usize = std::mem::size_of::<usize>();

/// Dump location inside `temp_dir`
pub fn dump_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(DUMP_FILE_NAME)
}

/// Installed crash-dump handlers
#[derive(Debug)]
pub struct CrashDump {
    path: PathBuf,
}

impl CrashDump {
    /// Install the fault handlers, writing dumps into `temp_dir`
    ///
    /// Also chains a panic hook that aborts, so panics end in a dump too.
    pub fn install(temp_dir: &Path) -> Result<Self, CrashError> {
        let path = dump_path(temp_dir);
        imp::install(&path)?;
        log::debug!("Stack trace file is {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the frames of a dump file
pub fn read_dump(path: &Path) -> Result<Vec<usize>, CrashError> {
    let bytes = std::fs::read(path).map_err(|e| CrashError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(bytes
        .chunks_exact(WORD)
        .take(MAX_FRAMES)
        .map(|chunk| {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            usize::from_ne_bytes(word)
        })
        .collect())
}

/// Read and remove a dump left by a previous run
pub fn take_previous_dump(path: &Path) -> Option<Vec<usize>> {
    if !path.exists() {
        return None;
    }
    let frames = match read_dump(path) {
        Ok(frames) => Some(frames),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    };
    if let Err(e) = std::fs::remove_file(path) {
        log::warn!("Failed to remove {}: {}", path.display(), e);
    }
    frames
}

/// One line per frame, `#N 0x...`
pub fn format_frames(frames: &[usize]) -> String {
    frames
        .iter()
        .enumerate()
        .map(|(i, ip)| format!("#{:<3} {:#018x}", i, ip))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(all(unix, feature = "stacktrace"))]
mod imp {
    use super::{CrashError, MAX_FRAMES};
    use nix::fcntl::{open, OFlag};
    use nix::sys::signal::{raise, signal, SigHandler, Signal};
    use nix::sys::stat::Mode;
    use nix::unistd::{close, write};
    use std::ffi::{c_int, CStr, CString};
    use std::os::fd::BorrowedFd;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;
    use std::sync::OnceLock;

    /// Resolved before the handlers are installed, read-only afterwards
    static DUMP_PATH: OnceLock<CString> = OnceLock::new();

    extern "C" fn on_fault(signum: c_int) {
        let Ok(sig) = Signal::try_from(signum) else {
            return;
        };
        // SAFETY: restoring the default disposition so a second fault
        // terminates instead of looping.
        let _ = unsafe { signal(sig, SigHandler::SigDfl) };
        if let Some(path) = DUMP_PATH.get() {
            write_dump(path);
        }
        let _ = raise(sig);
    }

    /// Async-signal-safe: stack buffer, open(2), write(2), close(2)
    fn write_dump(path: &CStr) {
        let mut frames = [0usize; MAX_FRAMES];
        let mut count = 0;
        // SAFETY: the process is going down; no other tracer runs concurrently.
        unsafe {
            backtrace::trace_unsynchronized(|frame| {
                frames[count] = frame.ip() as usize;
                count += 1;
                count < MAX_FRAMES
            });
        }

        let flags = OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC;
        let Ok(fd) = open(path, flags, Mode::from_bits_truncate(0o600)) else {
            return;
        };
        {
            // SAFETY: `fd` was just opened and is closed below.
            let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
            for ip in &frames[..count] {
                let _ = write(borrowed, &ip.to_ne_bytes());
            }
        }
        let _ = close(fd);
    }

    pub(super) fn install(path: &Path) -> Result<(), CrashError> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| CrashError::InvalidPath(path.to_path_buf()))?;
        DUMP_PATH
            .set(c_path)
            .map_err(|_| CrashError::AlreadyInstalled)?;

        for sig in [Signal::SIGSEGV, Signal::SIGABRT] {
            // SAFETY: `on_fault` only uses async-signal-safe calls.
            unsafe { signal(sig, SigHandler::Handler(on_fault)) }.map_err(|e| {
                CrashError::Install {
                    signal: sig.as_str(),
                    reason: e.to_string(),
                }
            })?;
        }

        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_hook(info);
            std::process::abort();
        }));
        Ok(())
    }
}

#[cfg(not(all(unix, feature = "stacktrace")))]
mod imp {
    use super::CrashError;
    use std::path::Path;

    pub(super) fn install(_path: &Path) -> Result<(), CrashError> {
        Err(CrashError::Unsupported)
    }
}

/// Crash-dump errors
#[derive(Debug, thiserror::Error)]
pub enum CrashError {
    #[error("Crash dumps are not supported by this build")]
    Unsupported,

    #[error("Crash dump handler already installed")]
    AlreadyInstalled,

    #[error("Stack trace path {} cannot be used", .0.display())]
    InvalidPath(PathBuf),

    #[error("Failed to install handler for {signal}: {reason}")]
    Install { signal: &'static str, reason: String },

    #[error("Failed to read stack trace {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
