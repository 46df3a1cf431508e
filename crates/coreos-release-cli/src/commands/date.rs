use std::io::Write;

use clap::Args;
use coreos_release_core::{DEFAULT_DATE_FORMAT, format_timestamp, parse_date_expression};

use crate::context::{AppContext, CliResult};
use crate::output::{DecodedDate, EncodedDate, render_decoded, render_encoded};

#[derive(Args, Debug, Default)]
pub(crate) struct DecodeArgs {
    #[arg(
        value_name = "VERSION",
        help = "Version or build number to decode (defaults to the current version)"
    )]
    pub(crate) target: Option<String>,
    #[arg(
        long,
        short = 'f',
        help = "strftime-style output format; a leading '+' is accepted as with date(1)"
    )]
    pub(crate) format: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EncodeArgs {
    #[arg(
        long,
        short = 'd',
        help = "Date to encode: @SECONDS, RFC 3339, YYYY-MM-DD or 'YYYY-MM-DD HH:MM:SS' (default now)"
    )]
    pub(crate) date: Option<String>,
}

pub(crate) fn handle_decode(
    ctx: &AppContext<'_>,
    args: &DecodeArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let explicit = args.target.as_deref().filter(|target| !target.trim().is_empty());
    let day_index = match explicit {
        Some(target) => ctx.config.resolve_day_index(Some(target))?,
        None => ctx.release_config()?.resolve_day_index(None)?,
    };
    let timestamp = ctx.config.codec().decode(day_index);
    let format = args
        .format
        .as_deref()
        .map_or(DEFAULT_DATE_FORMAT, |format| {
            format.strip_prefix('+').unwrap_or(format)
        });
    let date = format_timestamp(timestamp, ctx.config.time_zone(), format)?;

    render_decoded(
        out,
        ctx.output,
        &DecodedDate {
            day_index,
            timestamp,
            date,
        },
    )
}

pub(crate) fn handle_encode(
    ctx: &AppContext<'_>,
    args: &EncodeArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let timestamp = match args.date.as_deref() {
        Some(expression) => parse_date_expression(expression, ctx.config.time_zone())?,
        None => ctx.clock.now(),
    };
    let day_index = ctx.config.codec().encode(timestamp);
    render_encoded(
        out,
        ctx.output,
        &EncodedDate {
            timestamp,
            day_index,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::context::CliError;
    use coreos_release_core::{FixedClock, ReleaseConfig};
    use coreos_release_test_support::fixtures::{TEST_EPOCH, day_start};
    use serde_json::Value;

    fn context(clock: &FixedClock, output: OutputFormat) -> AppContext<'_> {
        AppContext {
            config: ReleaseConfig::new(TEST_EPOCH).with_current_version("3.1.0"),
            clock,
            output,
            version_file: None,
        }
    }

    fn capture(run: impl FnOnce(&mut dyn Write) -> CliResult<()>) -> CliResult<String> {
        let mut out = Vec::new();
        run(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn decode_defaults_to_current_version() -> CliResult<()> {
        let clock = FixedClock(0);
        let ctx = context(&clock, OutputFormat::Table);
        let args = DecodeArgs {
            target: None,
            format: Some("+%Y-%m-%d".to_string()),
        };
        let text = capture(|out| handle_decode(&ctx, &args, out))?;
        assert_eq!(text, "2014-05-16\n");
        Ok(())
    }

    #[test]
    fn decode_renders_json() -> CliResult<()> {
        let clock = FixedClock(0);
        let ctx = context(&clock, OutputFormat::Json);
        let args = DecodeArgs {
            target: Some("v1.0.0".to_string()),
            format: Some("%s".to_string()),
        };
        let text = capture(|out| handle_decode(&ctx, &args, out))?;
        let value: Value = serde_json::from_str(&text).map_err(CliError::failure)?;
        assert_eq!(value["day_index"], 1);
        assert_eq!(value["timestamp"], 1_400_086_400_i64);
        assert_eq!(value["date"], "1400086400");
        Ok(())
    }

    #[test]
    fn decode_rejects_malformed_versions() {
        let clock = FixedClock(0);
        let ctx = context(&clock, OutputFormat::Table);
        let args = DecodeArgs {
            target: Some("abc.5.0".to_string()),
            format: None,
        };
        let err = capture(|out| handle_decode(&ctx, &args, out)).expect_err("parse failure");
        assert_eq!(err.exit_code(), 2);
        assert!(err.display_message().contains("abc.5.0"));
    }

    #[test]
    fn encode_reads_clock_or_date_argument() -> CliResult<()> {
        let clock = FixedClock(day_start(4) + 1);
        let ctx = context(&clock, OutputFormat::Table);
        let now = capture(|out| handle_encode(&ctx, &EncodeArgs::default(), out))?;
        assert_eq!(now, "4\n");

        let args = EncodeArgs {
            date: Some("@1399999999".to_string()),
        };
        let before = capture(|out| handle_encode(&ctx, &args, out))?;
        assert_eq!(before, "-1\n");
        Ok(())
    }

    #[test]
    fn encode_rejects_unparseable_dates() {
        let clock = FixedClock(0);
        let ctx = context(&clock, OutputFormat::Table);
        let args = EncodeArgs {
            date: Some("next tuesday".to_string()),
        };
        let err = capture(|out| handle_encode(&ctx, &args, out)).expect_err("bad date");
        assert!(matches!(err, CliError::Validation(_)));
    }
}
