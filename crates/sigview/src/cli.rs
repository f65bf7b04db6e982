//! Command-line interface for sigview

use crate::config::{InvocationConfig, LogLevel};
use argh::FromArgs;
use std::io::Write;
use std::path::PathBuf;

/// SigView - signal acquisition and protocol analysis
#[derive(FromArgs, Debug, Default)]
#[argh(help_triggers("-h", "-?", "--help"))]
pub struct Args {
    /// show release version
    #[argh(switch, short = 'V')]
    pub version: bool,

    /// set acquisition and decoder log level (0-5)
    #[argh(option, short = 'l')]
    pub loglevel: Vec<String>,

    /// specify the device driver to use
    #[argh(option, short = 'd')]
    pub driver: Vec<String>,

    /// don't auto-scan for devices, use -d spec only
    #[argh(switch, short = 'D')]
    pub no_scan: bool,

    /// load input from file
    #[argh(option, short = 'i')]
    pub input_file: Vec<String>,

    /// input format
    #[argh(option, short = 'I')]
    pub input_format: Vec<String>,

    /// don't restore previous sessions on startup
    #[argh(switch, short = 'c')]
    pub clean: bool,

    /// don't use logging, output to stdout instead
    #[argh(switch, short = 's')]
    pub log_to_stdout: bool,

    /// file to open
    #[argh(positional)]
    pub files: Vec<String>,
}

/// Output stream for an early exit message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Parser request to terminate before any subsystem starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyExit {
    /// Process exit code
    pub code: i32,
    /// Text to print
    pub output: String,
    /// Where to print it
    pub stream: OutputStream,
}

impl EarlyExit {
    fn stdout(output: impl Into<String>) -> Self {
        Self {
            code: 0,
            output: output.into(),
            stream: OutputStream::Stdout,
        }
    }

    fn usage_error(output: impl Into<String>) -> Self {
        Self {
            code: 1,
            output: output.into(),
            stream: OutputStream::Stderr,
        }
    }

    /// Print the message to its stream
    pub fn print(&self) {
        let text = if self.output.ends_with('\n') {
            self.output.clone()
        } else {
            format!("{}\n", self.output)
        };
        // Nothing sensible remains to be done if the console is gone
        let _ = match self.stream {
            OutputStream::Stdout => std::io::stdout().write_all(text.as_bytes()),
            OutputStream::Stderr => std::io::stderr().write_all(text.as_bytes()),
        };
    }
}

/// Result of parsing the argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Continue startup with this configuration
    Run {
        config: InvocationConfig,
        /// Non-fatal validation problems, reported once logging is up
        warnings: Vec<String>,
    },
    /// Terminate immediately
    Exit(EarlyExit),
}

/// Print name and version
pub fn version_string() -> String {
    format!("{} {}", crate::TITLE, crate::VERSION)
}

/// Take the last non-empty occurrence of a repeated option
fn last_value(values: &[String]) -> Option<String> {
    values.last().filter(|v| !v.is_empty()).cloned()
}

/// Parse the argument list, excluding the program name
pub fn parse_invocation<I, S>(args: I) -> ParseOutcome
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let parsed = match Args::from_args(&[crate::BIN_NAME], &args) {
        Ok(parsed) => parsed,
        Err(early) => {
            return ParseOutcome::Exit(match early.status {
                Ok(()) => EarlyExit::stdout(early.output),
                Err(()) => EarlyExit::usage_error(early.output),
            });
        }
    };

    if parsed.version {
        return ParseOutcome::Exit(EarlyExit::stdout(version_string()));
    }

    parsed.into_outcome()
}

impl Args {
    /// Validate parsed arguments into an invocation config
    pub fn into_outcome(self) -> ParseOutcome {
        if self.files.len() > 1 {
            return ParseOutcome::Exit(EarlyExit::usage_error("Only one file can be opened."));
        }

        let mut warnings = Vec::new();

        // Each occurrence is applied in turn; an invalid one keeps the level before it
        let mut log_level = None;
        for spec in &self.loglevel {
            match LogLevel::parse(spec) {
                Ok(level) => log_level = Some(level),
                Err(e) => warnings.push(e.to_string()),
            }
        }

        let input_file = self
            .files
            .first()
            .filter(|f| !f.is_empty())
            .cloned()
            .or_else(|| last_value(&self.input_file))
            .map(PathBuf::from);

        let config = InvocationConfig {
            log_level,
            driver_spec: last_value(&self.driver),
            scan_for_devices: !self.no_scan,
            input_file,
            input_format: last_value(&self.input_format),
            restore_previous_sessions: !self.clean,
            use_logging: !self.log_to_stdout,
        };

        ParseOutcome::Run { config, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_config(args: &[&str]) -> (InvocationConfig, Vec<String>) {
        match parse_invocation(args.iter().copied()) {
            ParseOutcome::Run { config, warnings } => (config, warnings),
            ParseOutcome::Exit(exit) => panic!("unexpected exit: {:?}", exit),
        }
    }

    fn early_exit(args: &[&str]) -> EarlyExit {
        match parse_invocation(args.iter().copied()) {
            ParseOutcome::Exit(exit) => exit,
            ParseOutcome::Run { config, .. } => panic!("unexpected run: {:?}", config),
        }
    }

    #[test]
    fn test_no_arguments_gives_defaults() {
        let (config, warnings) = run_config(&[]);
        assert_eq!(config, InvocationConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_help_aliases() {
        for flag in ["-h", "-?", "--help"] {
            let exit = early_exit(&[flag]);
            assert_eq!(exit.code, 0, "flag {}", flag);
            assert_eq!(exit.stream, OutputStream::Stdout);
            assert!(exit.output.contains("--input-file"), "flag {}", flag);
        }
    }

    #[test]
    fn test_help_wins_over_surplus_positionals() {
        let exit = early_exit(&["a.sr", "b.sr", "--help"]);
        assert_eq!(exit.code, 0);
    }

    #[test]
    fn test_version() {
        for flag in ["-V", "--version"] {
            let exit = early_exit(&[flag]);
            assert_eq!(exit.code, 0);
            assert_eq!(exit.stream, OutputStream::Stdout);
            assert!(exit.output.contains(crate::TITLE));
            assert!(exit.output.contains(crate::VERSION));
        }
    }

    #[test]
    fn test_two_positionals_is_fatal() {
        let exit = early_exit(&["a.bin", "b.bin"]);
        assert_eq!(exit.code, 1);
        assert_eq!(exit.stream, OutputStream::Stderr);
        assert_eq!(exit.output, "Only one file can be opened.");
    }

    #[test]
    fn test_repeated_input_file_last_wins() {
        let (config, _) = run_config(&["-i", "a.bin", "-i", "b.bin"]);
        assert_eq!(config.input_file, Some(PathBuf::from("b.bin")));
    }

    #[test]
    fn test_positional_overrides_input_file_option() {
        let (config, _) = run_config(&["-i", "a.bin", "c.bin"]);
        assert_eq!(config.input_file, Some(PathBuf::from("c.bin")));
    }

    #[test]
    fn test_all_long_options() {
        let (config, warnings) = run_config(&[
            "--loglevel",
            "4",
            "--driver",
            "demo:samplerate=1M",
            "--no-scan",
            "--input-file",
            "capture.sr",
            "--input-format",
            "srzip",
            "--clean",
            "--log-to-stdout",
        ]);
        assert!(warnings.is_empty());
        assert_eq!(config.log_level, Some(LogLevel::DEBUG));
        assert_eq!(config.driver_spec.as_deref(), Some("demo:samplerate=1M"));
        assert!(!config.scan_for_devices);
        assert_eq!(config.input_file, Some(PathBuf::from("capture.sr")));
        assert_eq!(config.input_format.as_deref(), Some("srzip"));
        assert!(!config.restore_previous_sessions);
        assert!(!config.use_logging);
    }

    #[test]
    fn test_short_options() {
        let (config, _) = run_config(&["-l", "5", "-d", "demo", "-D", "-c", "-s", "-I", "vcd"]);
        assert_eq!(config.log_level, Some(LogLevel::SPEW));
        assert_eq!(config.driver_spec.as_deref(), Some("demo"));
        assert!(!config.scan_for_devices);
        assert!(!config.restore_previous_sessions);
        assert!(!config.use_logging);
        assert_eq!(config.input_format.as_deref(), Some("vcd"));
        assert!(config.input_file.is_none());
    }

    #[test]
    fn test_out_of_range_log_level_is_a_warning() {
        let (config, warnings) = run_config(&["-l", "9"]);
        assert!(config.log_level.is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("invalid log level"));
    }

    #[test]
    fn test_non_numeric_log_level_is_a_warning() {
        let (config, warnings) = run_config(&["--loglevel", "verbose"]);
        assert!(config.log_level.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_invalid_log_level_keeps_previous_one() {
        let (config, warnings) = run_config(&["-l", "3", "-l", "9"]);
        assert_eq!(config.log_level, Some(LogLevel::INFO));
        assert_eq!(warnings, vec!["invalid log level '9', expected 0-5"]);

        let (config, warnings) = run_config(&["-l", "x", "-l", "2"]);
        assert_eq!(config.log_level, Some(LogLevel::WARN));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_file_named_help_is_opened() {
        let (config, _) = run_config(&["help"]);
        assert_eq!(config.input_file, Some(PathBuf::from("help")));

        let (config, _) = run_config(&["-c", "help", "-l", "4"]);
        assert_eq!(config.input_file, Some(PathBuf::from("help")));
        assert_eq!(config.log_level, Some(LogLevel::DEBUG));
    }

    #[test]
    fn test_help_alias_as_option_value() {
        let (config, _) = run_config(&["-i", "-h"]);
        assert_eq!(config.input_file, Some(PathBuf::from("-h")));
    }

    #[test]
    fn test_unknown_option_is_usage_error() {
        let exit = early_exit(&["--frobnicate"]);
        assert_eq!(exit.code, 1);
        assert_eq!(exit.stream, OutputStream::Stderr);
    }

    #[test]
    fn test_help_alias_after_double_dash_is_a_file() {
        let (config, _) = run_config(&["--", "-h"]);
        assert_eq!(config.input_file, Some(PathBuf::from("-h")));
    }
}
