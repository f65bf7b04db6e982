//! Built-in collaborators used by the `sigview` binary

mod context;
mod decoders;
mod window;

pub use context::{DemoContext, DEMO_DRIVER, LOOPBACK_DRIVER};
pub use decoders::{default_decoders_dir, DirectoryDecoders, DECODERS_DIR_ENV};
pub use window::{ConsoleWindow, Session, SessionSource};

use crate::config::default_settings_path;
use crate::context::{ContextError, ContextHandle};
use crate::decoder::DecoderEngine;
use crate::platform::Platform;
use crate::window::{MainWindow, WindowContext, WindowError};
use std::path::PathBuf;
use std::sync::Arc;

/// Platform wiring the demo context, directory decoders and console window
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    settings_path: Option<PathBuf>,
    temp_dir: PathBuf,
    decoders_dir: PathBuf,
}

impl HeadlessPlatform {
    /// Platform using the default locations
    pub fn new() -> Self {
        Self {
            settings_path: default_settings_path(),
            temp_dir: std::env::temp_dir(),
            decoders_dir: default_decoders_dir(),
        }
    }

    pub fn with_settings_path(mut self, path: Option<PathBuf>) -> Self {
        self.settings_path = path;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_decoders_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.decoders_dir = dir.into();
        self
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    fn create_context(&mut self) -> Result<ContextHandle, ContextError> {
        Ok(Arc::new(DemoContext::new()))
    }

    fn decoder_engine(&mut self) -> Option<Box<dyn DecoderEngine>> {
        Some(Box::new(DirectoryDecoders::new(self.decoders_dir.clone())))
    }

    fn create_window(&mut self, ctx: WindowContext) -> Result<Box<dyn MainWindow>, WindowError> {
        Ok(Box::new(ConsoleWindow::new(ctx)))
    }

    fn settings_path(&self) -> Option<PathBuf> {
        self.settings_path.clone()
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone()
    }
}
