//! Logging subsystem
//!
//! With logging enabled every record goes through [`BufferedLogger`]: it is
//! formatted by `env_logger` onto stderr and kept in a bounded history that
//! the main window's log view reads. With logging disabled `env_logger`
//! writes straight to stdout and no history is kept. Either way the rest of
//! the crate only uses the `log` macros.

use crate::config::{GlobalSettings, LogLevel, KEY_LOG_BUFFER_SIZE};
use chrono::{DateTime, Local};
use log::{Level, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_FILTER: &str = "info";

/// A single captured log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// One-line rendering for the log view
    pub fn format_line(&self) -> String {
        format!(
            "{} {:<5} [{}] {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.level,
            self.target,
            self.message
        )
    }
}

#[derive(Debug)]
struct History {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

/// Thread-safe, fixed-capacity log history
#[derive(Debug, Clone)]
pub struct LogBuffer(Arc<Mutex<History>>);

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self(Arc::new(Mutex::new(History {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        })))
    }

    /// Buffer sized from the `log/buffer_size` setting
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        let size = settings
            .get_int(KEY_LOG_BUFFER_SIZE)
            .and_then(|s| usize::try_from(s).ok())
            .unwrap_or(1000);
        Self::new(size)
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, entry: LogEntry) {
        let mut history = self.lock();
        if history.entries.len() >= history.capacity {
            history.entries.pop_front();
        }
        history.entries.push_back(entry);
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current history, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.lock().entries.iter().cloned().collect()
    }
}

/// `env_logger` formatting plus history capture
pub struct BufferedLogger {
    inner: env_logger::Logger,
    buffer: LogBuffer,
}

impl BufferedLogger {
    pub fn new(inner: env_logger::Logger, buffer: LogBuffer) -> Self {
        Self { inner, buffer }
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }
}

impl Log for BufferedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }

        self.inner.log(record);
        self.buffer.push(LogEntry {
            timestamp: Local::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// `RUST_LOG` or `info`; a `--loglevel` above info raises this crate's filter
fn builder(verbosity: Option<LogLevel>) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER));
    if let Some(filter) = verbosity.map(LogLevel::to_level_filter) {
        if filter > log::LevelFilter::Info {
            builder.filter_module(crate::BIN_NAME, filter);
        }
    }
    builder
}

/// Install the logging subsystem, returning the history it fills
pub fn init(
    settings: &GlobalSettings,
    verbosity: Option<LogLevel>,
) -> Result<LogBuffer, log::SetLoggerError> {
    let inner = builder(verbosity).target(env_logger::Target::Stderr).build();
    let filter = inner.filter();
    let buffer = LogBuffer::from_settings(settings);

    log::set_boxed_logger(Box::new(BufferedLogger::new(inner, buffer.clone())))?;
    log::set_max_level(filter);
    Ok(buffer)
}

/// Bypass the logging subsystem and print diagnostics on stdout
pub fn init_stdout(verbosity: Option<LogLevel>) -> Result<(), log::SetLoggerError> {
    builder(verbosity).target(env_logger::Target::Stdout).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: Local::now(),
            level: Level::Info,
            target: "sigview".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_buffer_drops_oldest() {
        let buffer = LogBuffer::new(2);
        buffer.push(entry("one"));
        buffer.push(entry("two"));
        buffer.push(entry("three"));

        let messages: Vec<_> = buffer.snapshot().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_buffer_capacity_from_settings() {
        let settings = GlobalSettings::in_memory();
        assert_eq!(LogBuffer::from_settings(&settings).capacity(), 1000);

        settings.set(KEY_LOG_BUFFER_SIZE, 0i64);
        assert_eq!(LogBuffer::from_settings(&settings).capacity(), 1);

        settings.set(KEY_LOG_BUFFER_SIZE, -5i64);
        assert_eq!(LogBuffer::from_settings(&settings).capacity(), 1000);
    }

    #[test]
    fn test_buffered_logger_captures_matching_records() {
        let inner = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .is_test(true)
            .build();
        let logger = BufferedLogger::new(inner, LogBuffer::new(10));

        logger.log(
            &Record::builder()
                .level(Level::Error)
                .target("sigview::test")
                .args(format_args!("kept"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("sigview::test")
                .args(format_args!("filtered"))
                .build(),
        );

        let entries = logger.buffer().snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
        assert!(entries[0].format_line().contains("[sigview::test] kept"));
    }

    #[test]
    fn test_history_len() {
        let buffer = LogBuffer::new(3);
        assert!(buffer.is_empty());
        buffer.push(entry("x"));
        assert_eq!(buffer.len(), 1);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_spew_level_enables_trace_for_crate() {
        let logger = builder(Some(LogLevel::SPEW)).build();
        let metadata = Metadata::builder()
            .level(Level::Trace)
            .target("sigview::headless::context")
            .build();
        assert!(logger.enabled(&metadata));
    }

    #[test]
    fn test_debug_level_enables_debug_for_crate() {
        let logger = builder(Some(LogLevel::DEBUG)).build();
        let debug = Metadata::builder()
            .level(Level::Debug)
            .target("sigview::launcher")
            .build();
        assert!(logger.enabled(&debug));
    }
}
