//! Preflight command - runs preflight checks.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::preflight;

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config, entry: Option<&Path>, strict: bool) -> Result<()> {
    if strict {
        preflight::run_preflight_or_fail(config, entry)?;
    } else {
        let report = preflight::run_preflight(config, entry);
        report.print();
        if !report.all_passed() {
            println!("Some checks failed. Use --strict to fail on errors.");
        }
    }
    Ok(())
}
