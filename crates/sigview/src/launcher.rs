//! Startup and shutdown orchestration
//!
//! Brings the subsystems up in a fixed order, hands control to the main
//! window's event loop and tears everything down in reverse, whether the
//! loop returned, failed or panicked.

use crate::cli::{self, ParseOutcome};
use crate::config::{
    GlobalSettings, InitialSession, InvocationConfig, LogLevel, KEY_LOG_NOTIFY_OF_STACKTRACE,
    SETTINGS_FORMAT,
};
use crate::context::ContextHandle;
use crate::crash::{self, CrashDump};
use crate::decoder::DecoderSession;
use crate::device::DeviceManager;
use crate::error::LaunchError;
use crate::logging::{self, LogBuffer};
use crate::platform::{Capabilities, FailureCapture, Platform};
use crate::signals::SignalHandler;
use crate::window::{MainWindow, WindowContext};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Exit code for usage errors and a missing acquisition context
pub const EXIT_FAILURE: i32 = 1;

/// Lifecycle orchestrator
pub struct Launcher<P: Platform> {
    platform: P,
    capabilities: Capabilities,
}

impl<P: Platform> Launcher<P> {
    /// Launcher with the capabilities compiled into this build
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            capabilities: Capabilities::from_build(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Run the whole lifecycle; `args` excludes the program name
    ///
    /// Returns the process exit code.
    pub fn run<I, S>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (config, warnings) = match cli::parse_invocation(args) {
            ParseOutcome::Run { config, warnings } => (config, warnings),
            ParseOutcome::Exit(exit) => {
                exit.print();
                return exit.code;
            }
        };

        let (settings, settings_error) = GlobalSettings::initialize(self.platform.settings_path());
        let log_buffer = start_logging(&config, &settings);
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        if let Some(e) = settings_error {
            log::warn!("{}, using defaults; settings will not be saved", e);
        }

        let context = match self.platform.create_context() {
            Ok(context) => context,
            Err(e) => {
                log::error!("{}", e);
                return EXIT_FAILURE;
            }
        };
        log::info!("Using {}", context.description());

        let mut decoder = self.decoder_session();

        if let Some(level) = config.log_level {
            context.set_log_level(level);
            decoder.set_log_level(level);
            if level == LogLevel::SPEW {
                match settings.file_path() {
                    Some(path) => log::info!(
                        "Settings: {} (format {})",
                        path.display(),
                        SETTINGS_FORMAT
                    ),
                    None => log::info!("Settings: in memory"),
                }
            }
        }

        let crash_dump = self.install_crash_dump();
        decoder.start();

        let outcome = match self.capabilities.failure_capture() {
            FailureCapture::CrashDump => {
                self.run_window(&context, &config, &settings, log_buffer, crash_dump.as_ref())
            }
            FailureCapture::CatchPanics => panic::catch_unwind(AssertUnwindSafe(|| {
                self.run_window(&context, &config, &settings, log_buffer, crash_dump.as_ref())
            }))
            .unwrap_or_else(|payload| Err(LaunchError::from_panic(payload))),
        };

        let code = match outcome {
            Ok(code) => code,
            Err(e) => {
                log::error!("{}", e);
                0
            }
        };

        decoder.shutdown();
        if let Err(e) = settings.sync() {
            log::warn!("{}", e);
        }
        drop(context);
        log::debug!("Exiting with code {}", code);
        code
    }

    fn decoder_session(&mut self) -> DecoderSession {
        if !self.capabilities.decode {
            return DecoderSession::absent();
        }
        match self.platform.decoder_engine() {
            Some(engine) => DecoderSession::new(engine),
            None => DecoderSession::absent(),
        }
    }

    fn install_crash_dump(&self) -> Option<CrashDump> {
        if !self.capabilities.crash_dump {
            return None;
        }
        match CrashDump::install(&self.platform.temp_dir()) {
            Ok(dump) => Some(dump),
            Err(e) => {
                log::warn!("Stack traces are unavailable: {}", e);
                None
            }
        }
    }

    /// Device manager, main window, initial session, signals, event loop
    fn run_window(
        &mut self,
        context: &ContextHandle,
        config: &InvocationConfig,
        settings: &GlobalSettings,
        log: Option<LogBuffer>,
        crash_dump: Option<&CrashDump>,
    ) -> Result<i32, LaunchError> {
        let devices = DeviceManager::new(
            context.clone(),
            config.driver_spec.as_deref(),
            config.scan_for_devices,
        )?;

        let mut window = self.platform.create_window(WindowContext {
            devices,
            settings: settings.clone(),
            log,
        })?;
        window.show();

        if let Some(dump) = crash_dump {
            report_previous_crash(dump.path(), settings);
        }
        open_initial_session(window.as_mut(), config.initial_session())?;

        let _signals = if self.capabilities.signals {
            match SignalHandler::prepare(window.close_handle()) {
                Ok(handler) => Some(handler),
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            }
        } else {
            None
        };

        let code = window.exec()?;
        log::info!("Main window closed with code {}", code);
        Ok(code)
    }
}

fn start_logging(config: &InvocationConfig, settings: &GlobalSettings) -> Option<LogBuffer> {
    if config.use_logging {
        match logging::init(settings, config.log_level) {
            Ok(buffer) => Some(buffer),
            Err(_) => {
                log::debug!("Logger already installed");
                None
            }
        }
    } else {
        if logging::init_stdout(config.log_level).is_err() {
            log::debug!("Logger already installed");
        }
        None
    }
}

/// An unreadable file is reported and replaced by an empty session
fn open_initial_session(
    window: &mut dyn MainWindow,
    session: InitialSession,
) -> Result<(), LaunchError> {
    match session {
        InitialSession::File { path, format } => {
            if let Err(e) = window.add_session_with_file(&path, format.as_deref()) {
                log::error!("{}", e);
                window.add_default_session()?;
            }
        }
        InitialSession::Restore => {
            let restored = window.restore_sessions()?;
            log::debug!("Restored {} session(s)", restored);
            if restored == 0 {
                window.add_default_session()?;
            }
        }
        InitialSession::Default => window.add_default_session()?,
    }
    Ok(())
}

fn report_previous_crash(path: &Path, settings: &GlobalSettings) {
    if !settings.get_bool(KEY_LOG_NOTIFY_OF_STACKTRACE).unwrap_or(true) {
        return;
    }
    if let Some(frames) = crash::take_previous_dump(path) {
        log::warn!(
            "The previous run crashed, stack trace from {}:\n{}",
            path.display(),
            crash::format_frames(&frames)
        );
    }
}
