//! Output renderers and formatting helpers for CLI commands.

use std::io::Write;
use std::path::Path;

use anyhow::anyhow;
use coreos_release_core::{DayIndex, ReleasePlan};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

#[derive(Debug, Serialize)]
pub(crate) struct DecodedDate {
    pub(crate) day_index: DayIndex,
    pub(crate) timestamp: i64,
    pub(crate) date: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct EncodedDate {
    pub(crate) timestamp: i64,
    pub(crate) day_index: DayIndex,
}

#[derive(Serialize)]
struct PlanView<'a> {
    #[serde(flatten)]
    plan: &'a ReleasePlan,
    version_string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_file: Option<String>,
}

pub(crate) fn render_decoded(
    out: &mut dyn Write,
    format: OutputFormat,
    decoded: &DecodedDate,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, decoded),
        OutputFormat::Table => write_line(out, &decoded.date),
    }
}

pub(crate) fn render_encoded(
    out: &mut dyn Write,
    format: OutputFormat,
    encoded: &EncodedDate,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, encoded),
        OutputFormat::Table => write_line(out, &encoded.day_index.to_string()),
    }
}

pub(crate) fn render_plan(
    out: &mut dyn Write,
    format: OutputFormat,
    plan: &ReleasePlan,
    written: Option<&Path>,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &PlanView {
                plan,
                version_string: plan.record().version_string(),
                version_file: written.map(|path| path.display().to_string()),
            },
        ),
        OutputFormat::Table => {
            write_line(out, &format!("version: {}", plan.version))?;
            write_line(out, &format!("tag: {}", plan.tag))?;
            write_line(out, &format!("branch: {}", plan.branch))?;
            write_line(
                out,
                &format!("previous: {}", display_or_none(plan.previous.as_ref())),
            )?;
            write_line(
                out,
                &format!("sdk: {}", display_or_none(plan.sdk_version.as_ref())),
            )?;
            write_line(
                out,
                &format!("build id: {}", display_or_none(plan.build_id.as_ref())),
            )?;
            if let Some(path) = written {
                write_line(out, &format!("version file: {}", path.display()))?;
            }
            Ok(())
        }
    }
}

fn display_or_none<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "none".to_string(), ToString::to_string)
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    write_line(out, &text)
}

fn write_line(out: &mut dyn Write, line: &str) -> CliResult<()> {
    writeln!(out, "{line}")
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coreos_release_core::{BuildId, Version};
    use serde_json::Value;

    fn plan() -> ReleasePlan {
        let version = Version::new(DayIndex::new(40), 4, 0);
        ReleasePlan {
            version,
            branch: version.branch_name(),
            tag: version.tag_name(),
            sdk_version: Some("40.3.0".to_string()),
            build_id: BuildId::parse("master-9").ok(),
            previous: Some(Version::new(DayIndex::new(40), 3, 0)),
        }
    }

    #[test]
    fn table_plan_lists_every_field() -> CliResult<()> {
        let mut out = Vec::new();
        render_plan(&mut out, OutputFormat::Table, &plan(), None)?;
        let text = String::from_utf8_lossy(&out);
        assert_eq!(
            text,
            "version: 40.4.0\ntag: v40.4.0\nbranch: build-40\nprevious: 40.3.0\nsdk: 40.3.0\nbuild id: master-9\n"
        );
        Ok(())
    }

    #[test]
    fn json_plan_includes_written_path() -> CliResult<()> {
        let mut out = Vec::new();
        render_plan(
            &mut out,
            OutputFormat::Json,
            &plan(),
            Some(Path::new("version.txt")),
        )?;
        let value: Value = serde_json::from_slice(&out).map_err(CliError::failure)?;
        assert_eq!(value["version_string"], "40.4.0+master-9");
        assert_eq!(value["version"]["minor"], 4);
        assert_eq!(value["tag"], "v40.4.0");
        assert_eq!(value["build_id"], "master-9");
        assert_eq!(value["version_file"], "version.txt");
        Ok(())
    }

    #[test]
    fn encoded_table_is_the_bare_index() -> CliResult<()> {
        let mut out = Vec::new();
        render_encoded(
            &mut out,
            OutputFormat::Table,
            &EncodedDate {
                timestamp: 0,
                day_index: DayIndex::new(-3),
            },
        )?;
        assert_eq!(out, b"-3\n");
        Ok(())
    }
}
