//! Extract matching tables to CSV
//!
//! Selects the first visible share, filters the catalog by pattern and
//! writes one `<schema>.<name>.csv` per non-empty table. Per-table failures
//! are printed and counted; they only fail the command with `--fail-on-error`.

use anyhow::{Context, Result};
use sharefetch_core::{ExtractionJob, JobConfig, Strategy};
use std::path::Path;
use std::sync::Arc;

use crate::config::CliConfig;
use crate::output::{
    print_catalog, print_info, print_no_matches, print_success, print_warning, summary_line,
    ConsoleReporter,
};

use super::{connect, profile_path};

/// Command-line overrides for the `extract` section of the config
#[derive(Debug, Default)]
pub struct ExtractArgs {
    pub pattern: Option<String>,
    pub output_dir: Option<String>,
    pub sequential: bool,
    pub fail_on_error: bool,
    pub dry_run: bool,
}

/// Merges config defaults and flags into the job settings
pub fn job_config(config: &CliConfig, args: &ExtractArgs) -> Result<JobConfig> {
    let profile = profile_path(config)?;
    let strategy = if args.sequential {
        Strategy::Sequential
    } else {
        config.extract.strategy
    };

    Ok(JobConfig::new(profile)
        .with_pattern(
            args.pattern
                .clone()
                .unwrap_or_else(|| config.extract.pattern.clone()),
        )
        .with_output_dir(
            args.output_dir
                .clone()
                .unwrap_or_else(|| config.extract.output_dir.clone()),
        )
        .with_strategy(strategy))
}

pub async fn run(config: &CliConfig, args: ExtractArgs) -> Result<()> {
    let job_config = job_config(config, &args)?;
    let fail_on_error = args.fail_on_error || config.extract.fail_on_error;

    let client = connect(config).await?;
    let job = ExtractionJob::init(client, job_config)
        .await
        .context("Failed to initialize extraction")?;

    print_info(&format!("Share: {}", job.share().name));

    let output_dir = &job.config().output_dir;
    if !Path::new(output_dir).is_dir() {
        print_warning(&format!(
            "Output directory {} does not exist; tables will fail to write",
            output_dir.display()
        ));
    }

    if args.dry_run {
        let matched = job.catalog().await.context("Failed to list tables")?;
        if matched.is_empty() {
            print_no_matches(&job.config().pattern);
        } else {
            print_catalog(&matched);
        }
        print_warning("Dry run mode - no tables fetched");
        return Ok(());
    }

    let report = job
        .run(Arc::new(ConsoleReporter))
        .await
        .context("Extraction failed")?;

    println!();
    if report.has_failures() {
        print_warning(&summary_line(&report));
        if fail_on_error {
            anyhow::bail!("{} table(s) failed", report.failed());
        }
    } else {
        print_success(&summary_line(&report));
    }

    Ok(())
}
