//! SigView application launcher
//!
//! Startup and shutdown orchestration for a signal acquisition and protocol
//! analysis application.
//!
//! # Overview
//!
//! The launcher:
//! - Parses the command line into an immutable invocation config
//! - Brings the settings store, logging, acquisition context, decoder engine,
//!   device manager and main window up in a fixed order
//! - Hands control to the main window's event loop
//! - Tears the decoder engine down exactly once, on every exit path
//!
//! Collaborators are created through a [`Platform`]. The [`headless`]
//! platform used by the `sigview` binary provides a demo acquisition
//! context, a directory-backed decoder catalog and a console main window.
//!
//! # Example
//!
//! ```no_run
//! use sigview::{HeadlessPlatform, Launcher};
//!
//! let code = Launcher::new(HeadlessPlatform::new()).run(["--driver", "demo"]);
//! std::process::exit(code);
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod crash;
pub mod decoder;
pub mod device;
pub mod error;
pub mod headless;
pub mod launcher;
pub mod logging;
pub mod platform;
pub mod signals;
pub mod window;

/// Application title
pub const TITLE: &str = "SigView";

/// Binary and configuration directory name
pub const BIN_NAME: &str = "sigview";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cli::{parse_invocation, EarlyExit, OutputStream, ParseOutcome};
pub use config::{GlobalSettings, InitialSession, InvocationConfig, LogLevel, SettingValue};
pub use context::{AcquisitionContext, ContextError, ContextHandle, DeviceInfo, DriverOptions};
pub use decoder::{DecoderEngine, DecoderError, DecoderSession, SubsystemState};
pub use device::{DeviceError, DeviceManager, DriverSpec};
pub use error::LaunchError;
pub use headless::HeadlessPlatform;
pub use launcher::Launcher;
pub use platform::{Capabilities, FailureCapture, Platform};
pub use window::{CloseHandle, CloseListener, CloseReason, MainWindow, WindowContext, WindowError};
