//! Show command - displays information.

use anyhow::Result;
use std::path::Path;

use crate::build::layout::LOCK_FILENAME;
use crate::clean::{disk_usage, leftover_paths};
use crate::commands::build::artifact_for;
use crate::config::Config;

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config { json: bool },
    /// Show which build paths currently exist
    Status,
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget, entry: Option<&Path>) -> Result<()> {
    match target {
        ShowTarget::Config { json: true } => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ShowTarget::Config { json: false } => config.print(),
        ShowTarget::Status => {
            if let Some(artifact) = entry.and_then(|e| artifact_for(config, e)) {
                if artifact.is_file() {
                    println!(
                        "Artifact: {} ({} bytes)",
                        artifact.display(),
                        disk_usage(&artifact)
                    );
                } else {
                    println!("Artifact: {} (not built)", artifact.display());
                }
            }

            let leftovers = leftover_paths(config, entry)?;
            if leftovers.is_empty() {
                println!("No transient build state present.");
            } else {
                println!("Transient build state present:");
                for path in leftovers {
                    println!("  {} ({} bytes)", path.display(), disk_usage(&path));
                }
            }

            let lock = config.work_dir.join(LOCK_FILENAME);
            if lock.exists() {
                println!("Build lock held: {}", lock.display());
            }
        }
    }
    Ok(())
}
