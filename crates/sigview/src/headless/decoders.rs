//! Decoder engine cataloging decoders from a directory
//!
//! Each subdirectory of the root is one protocol decoder. A missing root is
//! an empty catalog.

use crate::config::LogLevel;
use crate::decoder::{DecoderEngine, DecoderError};
use std::path::PathBuf;

/// Overrides the decoder directory
pub const DECODERS_DIR_ENV: &str = "SIGVIEW_DECODERS_DIR";

/// Decoder directory from the environment, else the platform data dir
pub fn default_decoders_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DECODERS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .map(|d| d.join(crate::BIN_NAME).join("decoders"))
        .unwrap_or_else(|| PathBuf::from("decoders"))
}

#[derive(Debug)]
pub struct DirectoryDecoders {
    root: PathBuf,
    level: LogLevel,
    decoders: Vec<String>,
}

impl DirectoryDecoders {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            level: LogLevel::default(),
            decoders: Vec::new(),
        }
    }

    /// Names of the loaded decoders, sorted
    pub fn decoders(&self) -> &[String] {
        &self.decoders
    }
}

impl DecoderEngine for DirectoryDecoders {
    fn set_log_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    fn init(&mut self) -> Result<(), DecoderError> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(DecoderError::Init(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        if self.level.allows(LogLevel::INFO) {
            log::info!("Decoder directory: {}", self.root.display());
        }
        Ok(())
    }

    fn load_all(&mut self) -> Result<usize, DecoderError> {
        self.decoders.clear();
        if !self.root.exists() {
            return Ok(0);
        }

        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| DecoderError::Load(format!("{}: {}", self.root.display(), e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| DecoderError::Load(e.to_string()))?;
            if entry.path().is_dir() {
                self.decoders
                    .push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        self.decoders.sort();

        if self.level.allows(LogLevel::DEBUG) {
            log::debug!("Decoders: {}", self.decoders.join(", "));
        }
        Ok(self.decoders.len())
    }

    fn exit(&mut self) {
        self.decoders.clear();
        log::debug!("Decoder engine stopped");
    }
}
