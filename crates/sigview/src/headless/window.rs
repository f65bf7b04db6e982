//! Console main window
//!
//! Holds the session list and runs a tokio current-thread event loop until a
//! close request arrives. On an interactive terminal a `quit` line or end of
//! input also closes it.

use crate::config::{GlobalSettings, KEY_SESSIONS_SAVED};
use crate::device::DeviceManager;
use crate::logging::LogBuffer;
use crate::window::{CloseHandle, CloseListener, CloseReason, MainWindow, WindowContext, WindowError};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Where a session's data comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Empty,
    File {
        path: PathBuf,
        format: Option<String>,
    },
    Restored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: String,
    pub source: SessionSource,
}

pub struct ConsoleWindow {
    devices: DeviceManager,
    settings: GlobalSettings,
    log: Option<LogBuffer>,
    sessions: Vec<Session>,
    close: CloseHandle,
    listener: CloseListener,
    interactive: bool,
}

impl ConsoleWindow {
    pub fn new(ctx: WindowContext) -> Self {
        let (close, listener) = CloseHandle::channel();
        Self {
            devices: ctx.devices,
            settings: ctx.settings,
            log: ctx.log,
            sessions: Vec::new(),
            close,
            listener,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// Also close on a `quit` line or end of input
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    fn next_name(&self) -> String {
        format!("Session {}", self.sessions.len() + 1)
    }

    fn save_sessions(&self) {
        let names: Vec<String> = self.sessions.iter().map(|s| s.name.clone()).collect();
        self.settings.set(KEY_SESSIONS_SAVED, names);
    }

    async fn run_until_closed(&mut self) -> CloseReason {
        if !self.interactive {
            return self.listener.wait().await.unwrap_or(CloseReason::User);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                reason = self.listener.wait() => return reason.unwrap_or(CloseReason::User),
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) if matches!(line.trim(), "q" | "quit") => return CloseReason::User,
                Ok(Some(line)) => self.command(line.trim()),
                Ok(None) | Err(_) => return CloseReason::User,
            }
        }
    }

    fn command(&self, line: &str) {
        match line {
            "" => {}
            "sessions" => {
                for session in &self.sessions {
                    println!("{}", session.name);
                }
            }
            "devices" => {
                for device in self.devices.devices() {
                    println!("{}", device);
                }
            }
            "log" => match &self.log {
                Some(buffer) if !buffer.is_empty() => {
                    for entry in buffer.snapshot() {
                        println!("{}", entry.format_line());
                    }
                }
                Some(_) => println!("Log is empty"),
                None => println!("Logging goes to stdout"),
            },
            other => println!("Unknown command '{}'; try sessions, devices, log or quit", other),
        }
    }
}

impl MainWindow for ConsoleWindow {
    fn show(&mut self) {
        log::info!(
            "{} {} with {} device(s)",
            crate::TITLE,
            crate::VERSION,
            self.devices.devices().len()
        );
        if let Some(device) = self.devices.user_device() {
            log::info!("Selected device: {}", device);
        }
        if let Some(buffer) = &self.log {
            log::debug!("Log view keeps {} of {} entries", buffer.len(), buffer.capacity());
        }
    }

    fn restore_sessions(&mut self) -> Result<usize, WindowError> {
        let saved = self.settings.get_list(KEY_SESSIONS_SAVED);
        for name in &saved {
            self.sessions.push(Session {
                name: name.clone(),
                source: SessionSource::Restored,
            });
        }
        Ok(saved.len())
    }

    fn add_session_with_file(&mut self, path: &Path, format: Option<&str>) -> Result<(), WindowError> {
        if !path.is_file() {
            return Err(WindowError::Load {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.next_name());
        log::info!("Opening {}", path.display());
        self.sessions.push(Session {
            name,
            source: SessionSource::File {
                path: path.to_path_buf(),
                format: format.map(str::to_string),
            },
        });
        Ok(())
    }

    fn add_default_session(&mut self) -> Result<(), WindowError> {
        let name = self.next_name();
        self.sessions.push(Session {
            name,
            source: SessionSource::Empty,
        });
        Ok(())
    }

    fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    fn exec(&mut self) -> Result<i32, WindowError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let reason = runtime.block_on(self.run_until_closed());
        // The stdin reader may still be blocked in a read
        runtime.shutdown_background();

        log::info!("Closing main window ({})", reason);
        self.save_sessions();
        Ok(0)
    }
}
