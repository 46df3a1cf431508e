//! Argument parsing and command dispatch for the `coreos-release` CLI.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use coreos_release_core::{Clock, SystemClock};
use coreos_release_telemetry::{LogFormat, LoggingConfig};
use tracing::{debug, warn};

use crate::commands::date::{DecodeArgs, EncodeArgs, handle_decode, handle_encode};
use crate::commands::release::{NextArgs, handle_next};
use crate::context::{AppContext, CliResult};

/// Parses process arguments, installs logging, executes the requested command
/// against the system clock and returns the process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return report_parse_error(&err),
    };

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: LogFormat::from_name(&cli.log_format),
        ..LoggingConfig::default()
    };
    if let Err(err) = coreos_release_telemetry::init_logging(&logging) {
        if err.is_usage() {
            eprintln!("error: {err}");
            return 2;
        }
        eprintln!("warning: {err}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &SystemClock, &mut out)
}

/// Execute a command line against an explicit clock and output sink.
///
/// Errors are reported on stderr; the return value is the exit code the
/// binary would use.
pub fn run_with<I, T>(args: I, clock: &dyn Clock, out: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => execute(cli, clock, out),
        Err(err) => report_parse_error(&err),
    }
}

fn report_parse_error(err: &clap::Error) -> i32 {
    let _ = err.print();
    err.exit_code()
}

fn execute(cli: Cli, clock: &dyn Clock, out: &mut dyn Write) -> i32 {
    let command_name = command_label(cli.command.as_ref());
    let span = tracing::info_span!("command", name = command_name);
    let _entered = span.enter();

    match dispatch(cli, clock, out) {
        Ok(()) => {
            debug!("command completed");
            0
        }
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            warn!(exit_code, error = %message, "command failed");
            eprintln!("error: {message}");
            exit_code
        }
    }
}

fn dispatch(cli: Cli, clock: &dyn Clock, out: &mut dyn Write) -> CliResult<()> {
    let ctx = AppContext::from_cli(&cli, clock)?;
    match cli.command.unwrap_or_default() {
        Command::Decode(args) => handle_decode(&ctx, &args, out),
        Command::Encode(args) => handle_encode(&ctx, &args, out),
        Command::Next(args) => handle_next(&ctx, &args, out),
    }
}

#[derive(Parser)]
#[command(
    name = "coreos-release",
    about = "Convert between build numbers and dates, and plan release versions",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "COREOS_EPOCH",
        help = "Release epoch in seconds since the Unix epoch"
    )]
    pub(crate) epoch: Option<String>,
    #[arg(
        long = "current-version",
        global = true,
        env = "COREOS_VERSION",
        help = "Version used when a command does not name one"
    )]
    pub(crate) current_version: Option<String>,
    #[arg(
        long,
        global = true,
        env = "TZ",
        help = "Time zone for rendering and reading dates: UTC, ±HH:MM or an IANA name (default UTC)"
    )]
    pub(crate) tz: Option<String>,
    #[arg(
        long,
        global = true,
        env = "COREOS_VERSION_FILE",
        help = "KEY=value version file providing the current version"
    )]
    pub(crate) version_file: Option<PathBuf>,
    #[arg(
        long = "output",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format"
    )]
    pub(crate) output: OutputFormat,
    #[arg(
        long,
        global = true,
        env = "COREOS_LOG_LEVEL",
        default_value = coreos_release_telemetry::DEFAULT_LOG_LEVEL,
        help = "Log filter used when RUST_LOG is unset"
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "COREOS_LOG_FORMAT",
        default_value = "pretty",
        help = "Log format: pretty or json"
    )]
    pub(crate) log_format: String,
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a build number (from a version) into a date. Default command.
    Decode(DecodeArgs),
    /// Convert the current time or a given date into a build number.
    Encode(EncodeArgs),
    /// Plan the next release version and optionally record it.
    Next(NextArgs),
}

impl Default for Command {
    fn default() -> Self {
        Self::Decode(DecodeArgs::default())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) const fn command_label(command: Option<&Command>) -> &'static str {
    match command {
        None | Some(Command::Decode(_)) => "decode",
        Some(Command::Encode(_)) => "encode",
        Some(Command::Next(_)) => "next",
    }
}

#[cfg(test)]
impl Cli {
    pub(crate) fn for_tests(epoch: Option<&str>) -> Self {
        Self {
            epoch: epoch.map(str::to_string),
            current_version: None,
            tz: Some("UTC".to_string()),
            version_file: None,
            output: OutputFormat::Table,
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use coreos_release_core::FixedClock;
    use coreos_release_test_support::fixtures::{TEST_EPOCH, day_start};

    fn run_capture(args: &[&str], now: i64) -> (i32, String) {
        let mut out = Vec::new();
        let mut argv = vec!["coreos-release", "--epoch", "1400000000", "--tz", "UTC"];
        argv.extend_from_slice(args);
        let code = run_with(argv, &FixedClock(now), &mut out);
        (code, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn command_label_matches_variants() {
        assert_eq!(command_label(None), "decode");
        assert_eq!(
            command_label(Some(&Command::Encode(EncodeArgs::default()))),
            "encode"
        );
        assert_eq!(
            command_label(Some(&Command::Next(NextArgs::default()))),
            "next"
        );
    }

    #[test]
    fn missing_subcommand_defaults_to_decode() {
        let (code, out) = run_capture(
            &["--current-version", "1.0.0"],
            TEST_EPOCH,
        );
        assert_eq!(code, 0);
        assert_eq!(out.trim(), "Wed May 14 16:53:20 UTC 2014");
    }

    #[test]
    fn encode_uses_injected_clock() {
        let (code, out) = run_capture(&["encode"], day_start(12) + 7);
        assert_eq!(code, 0);
        assert_eq!(out.trim(), "12");
    }

    #[test]
    fn unknown_flags_are_usage_errors() {
        let (code, out) = run_capture(&["encode", "--bogus"], TEST_EPOCH);
        assert_eq!(code, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "coreos-release",
            "next",
            "--epoch",
            "5",
            "--output",
            "json",
        ])
        .expect("valid arguments");
        assert_eq!(cli.epoch.as_deref(), Some("5"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Some(Command::Next(_))));
    }
}
