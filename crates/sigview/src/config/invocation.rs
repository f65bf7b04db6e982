//! Invocation configuration produced by the option parser

use std::fmt;
use std::path::PathBuf;

/// Diagnostic verbosity shared by the acquisition context and the decoder engine
///
/// Levels follow the acquisition library numbering: 0 none, 1 error,
/// 2 warning, 3 info, 4 debug, 5 spew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogLevel(u8);

impl LogLevel {
    pub const NONE: LogLevel = LogLevel(0);
    pub const ERROR: LogLevel = LogLevel(1);
    pub const WARN: LogLevel = LogLevel(2);
    pub const INFO: LogLevel = LogLevel(3);
    pub const DEBUG: LogLevel = LogLevel(4);
    pub const SPEW: LogLevel = LogLevel(5);

    /// Highest accepted level
    pub const MAX: u8 = 5;

    /// Create a level, rejecting values outside 0..=5
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(LogLevel)
    }

    /// Parse a level from its command-line form
    pub fn parse(s: &str) -> Result<Self, InvalidLogLevel> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| InvalidLogLevel(s.to_string()))
    }

    /// Numeric value
    pub fn value(self) -> u8 {
        self.0
    }

    /// Equivalent filter for the `log` facade
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self.0 {
            0 => log::LevelFilter::Off,
            1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Whether a message at `level` passes this verbosity
    pub fn allows(self, level: LogLevel) -> bool {
        level.0 != 0 && level.0 <= self.0
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::WARN
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            0 => "none",
            1 => "error",
            2 => "warn",
            3 => "info",
            4 => "debug",
            _ => "spew",
        };
        write!(f, "{} ({})", self.0, name)
    }
}

/// Rejected `--loglevel` value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid log level '{0}', expected 0-{max}", max = LogLevel::MAX)]
pub struct InvalidLogLevel(pub String);

/// Configuration record built once from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationConfig {
    /// Verbosity for the acquisition context and decoder engine
    pub log_level: Option<LogLevel>,
    /// Driver selection string, passed opaquely to the device manager
    pub driver_spec: Option<String>,
    /// Whether the device manager scans all drivers
    pub scan_for_devices: bool,
    /// File opened as the initial session
    pub input_file: Option<PathBuf>,
    /// Format hint for `input_file`
    pub input_format: Option<String>,
    /// Whether previously saved sessions are restored
    pub restore_previous_sessions: bool,
    /// Whether the logging subsystem is used instead of plain stdout
    pub use_logging: bool,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            driver_spec: None,
            scan_for_devices: true,
            input_file: None,
            input_format: None,
            restore_previous_sessions: true,
            use_logging: true,
        }
    }
}

/// Which initial session the main window receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialSession {
    /// Open an explicit file
    File {
        path: PathBuf,
        format: Option<String>,
    },
    /// Restore the sessions saved by the previous run
    Restore,
    /// A single empty session
    Default,
}

impl InvocationConfig {
    /// Resolve the initial session; an explicit file always wins over restoration
    pub fn initial_session(&self) -> InitialSession {
        match &self.input_file {
            Some(path) => InitialSession::File {
                path: path.clone(),
                format: self.input_format.clone(),
            },
            None if self.restore_previous_sessions => InitialSession::Restore,
            None => InitialSession::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_range() {
        for v in 0..=5 {
            assert_eq!(LogLevel::new(v).map(LogLevel::value), Some(v as u8));
        }
        assert!(LogLevel::new(-1).is_none());
        assert!(LogLevel::new(6).is_none());
        assert!(LogLevel::new(i64::MAX).is_none());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("4"), Ok(LogLevel::DEBUG));
        assert_eq!(LogLevel::parse(" 0 "), Ok(LogLevel::NONE));
        assert!(LogLevel::parse("9").is_err());
        assert!(LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_log_level_filter_mapping() {
        assert_eq!(LogLevel::NONE.to_level_filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::WARN.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::SPEW.to_level_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_log_level_allows() {
        assert!(LogLevel::INFO.allows(LogLevel::ERROR));
        assert!(!LogLevel::INFO.allows(LogLevel::DEBUG));
        assert!(!LogLevel::SPEW.allows(LogLevel::NONE));
    }

    #[test]
    fn test_explicit_file_wins_over_restore() {
        let config = InvocationConfig {
            input_file: Some(PathBuf::from("capture.sr")),
            input_format: Some("srzip".to_string()),
            ..Default::default()
        };
        assert!(config.restore_previous_sessions);
        assert_eq!(
            config.initial_session(),
            InitialSession::File {
                path: PathBuf::from("capture.sr"),
                format: Some("srzip".to_string()),
            }
        );
    }

    #[test]
    fn test_initial_session_restore_and_default() {
        let config = InvocationConfig::default();
        assert_eq!(config.initial_session(), InitialSession::Restore);

        let clean = InvocationConfig {
            restore_previous_sessions: false,
            ..Default::default()
        };
        assert_eq!(clean.initial_session(), InitialSession::Default);
    }
}
