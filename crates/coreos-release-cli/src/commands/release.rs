use std::io::Write;

use clap::Args;
use coreos_release_core::{BuildId, DayIndex, ReleasePlan, ReleaseRequest, VersionOverrides};

use crate::context::{AppContext, CliError, CliResult};
use crate::output::render_plan;

const DEFAULT_BUILD_BRANCH: &str = "master";

#[derive(Args, Debug, Default)]
pub(crate) struct NextArgs {
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Pin the major instead of today's day index"
    )]
    pub(crate) major: Option<i64>,
    #[arg(long, help = "Pin the same-day counter")]
    pub(crate) minor: Option<u32>,
    #[arg(long, help = "Patch level (default 0)")]
    pub(crate) patch: Option<u32>,
    #[arg(
        long = "sdk-version",
        help = "SDK version to build against (defaults to the current version)"
    )]
    pub(crate) sdk_version: Option<String>,
    #[arg(
        long = "build-id",
        conflicts_with = "build_number",
        help = "Build metadata recorded with the version"
    )]
    pub(crate) build_id: Option<String>,
    #[arg(
        long = "build-number",
        help = "CI build counter; combined with --build-branch into the build id"
    )]
    pub(crate) build_number: Option<u64>,
    #[arg(
        long = "build-branch",
        requires = "build_number",
        help = "CI branch used with --build-number (default master)"
    )]
    pub(crate) build_branch: Option<String>,
    #[arg(long, help = "Store the plan in the version file")]
    pub(crate) write: bool,
}

impl NextArgs {
    fn request(&self) -> CliResult<ReleaseRequest> {
        let build_id = match (&self.build_id, self.build_number) {
            (Some(raw), _) => Some(BuildId::parse(raw.as_str())?),
            (None, Some(counter)) => {
                let branch = self.build_branch.as_deref().unwrap_or(DEFAULT_BUILD_BRANCH);
                Some(BuildId::from_counter(branch, counter)?)
            }
            (None, None) => None,
        };
        Ok(ReleaseRequest {
            overrides: VersionOverrides {
                major: self.major.map(DayIndex::new),
                minor: self.minor,
                patch: self.patch,
            },
            sdk_version: self.sdk_version.clone(),
            build_id,
        })
    }
}

pub(crate) fn handle_next(
    ctx: &AppContext<'_>,
    args: &NextArgs,
    out: &mut dyn Write,
) -> CliResult<()> {
    let target = if args.write {
        Some(ctx.version_file.as_deref().ok_or_else(|| {
            CliError::validation("--write requires --version-file or COREOS_VERSION_FILE")
        })?)
    } else {
        None
    };

    let request = args.request()?;
    let current = ctx.release_config()?.current_version()?;
    let plan = ReleasePlan::compute(&ctx.config.codec(), ctx.clock, current.as_ref(), &request)?;

    if let Some(path) = target {
        plan.record().store(path)?;
    }

    render_plan(out, ctx.output, &plan, target)
}
