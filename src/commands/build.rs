//! Build command - packages an entry point.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::build;
use crate::config::Config;
use crate::preflight;
use crate::timing::format_duration;

/// Options for the build command that are not part of [`Config`].
pub struct BuildOptions {
    /// Entry-point script.
    pub entry: PathBuf,
    /// Write a JSON build report here.
    pub report: Option<PathBuf>,
    /// Run strict preflight checks first.
    pub preflight: bool,
}

/// Execute the build command.
pub fn cmd_build(config: &Config, options: &BuildOptions) -> Result<()> {
    if options.preflight {
        preflight::run_preflight_or_fail(config, Some(options.entry.as_path()))?;
    }

    println!("=== Building {} ===\n", options.entry.display());
    let build_start = Instant::now();

    let report = build::run_build(config, &options.entry).map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!(
            "Build of {} failed after stage '{}'{}",
            options.entry.display(),
            stage,
            leftover_hint(config)
        ))
    })?;

    report.print();
    println!(
        "\nTotal build time: {}",
        format_duration(build_start.elapsed())
    );

    if let Some(path) = &options.report {
        let path = config.resolve(path);
        report
            .save(&path)
            .context("Build succeeded but report could not be saved")?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn leftover_hint(config: &Config) -> &'static str {
    if config.cleanup_on_failure {
        ""
    } else {
        " (build state left on disk; run `pybundle clean` to remove it)"
    }
}

/// Final artifact path for `entry`.
pub fn artifact_for(config: &Config, entry: &Path) -> Option<PathBuf> {
    build::BuildLayout::new(config, entry).map(|l| l.final_artifact())
}
