//! Preflight checks for a pybundle build.
//!
//! Validates the host interpreter and the working directory before a build
//! touches anything. Run with `pybundle preflight` to check a directory is
//! ready.

mod environment;
mod host_tools;
mod types;
mod validators;

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(config: &Config, entry: Option<&Path>) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host interpreter...");
    checks.extend(host_tools::check_host_tools(config));

    println!("Checking working directory...");
    checks.extend(environment::check_build_environment(config, entry));

    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config, entry: Option<&Path>) -> Result<()> {
    let report = run_preflight(config, entry);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
