//! Removal of leftover build state.
//!
//! A successful build cleans up after itself. This is for the state a
//! failed run leaves behind when `cleanup_on_failure` is off, or when the
//! process was killed mid-build.
//!
//! Cleaning takes the build lock, so it never runs under a live build. A
//! lock left behind by a killed process is only removed with `force`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::build::guard::remove_path;
use crate::build::layout::{check_transient_paths, BuildLayout, LOCK_FILENAME};
use crate::build::BuildLock;
use crate::config::Config;

/// Paths `clean` would remove, in removal order.
pub fn leftover_paths(config: &Config, entry: Option<&Path>) -> Result<Vec<PathBuf>> {
    Ok(candidate_paths(config, entry)?
        .into_iter()
        .filter(|p| p.exists())
        .collect())
}

fn candidate_paths(config: &Config, entry: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut paths = vec![
        config.env_dir.clone(),
        config.build_dir.clone(),
        config.dist_dir.clone(),
    ];

    match entry {
        Some(entry) => {
            let layout = BuildLayout::new(config, entry)
                .with_context(|| format!("No file name in {}", entry.display()))?;
            paths.push(layout.spec_file);
        }
        None => {
            let entries = fs::read_dir(&config.work_dir)
                .with_context(|| format!("Cannot read {}", config.work_dir.display()))?;
            let mut specs: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "spec"))
                .collect();
            specs.sort();
            paths.extend(specs);
        }
    }

    Ok(paths)
}

/// Total size of the files under `path`.
pub fn disk_usage(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// Remove leftover build state. Returns the number of bytes reclaimed.
///
/// Fails with [`BuildError::Busy`](crate::error::BuildError::Busy) while a
/// build holds the lock, unless `force` is set.
pub fn clean_build_state(config: &Config, entry: Option<&Path>, force: bool) -> Result<u64> {
    let mut protected = vec![config.work_dir.clone(), config.requirements.clone()];
    if let Some(entry) = entry {
        protected.push(config.resolve(entry));
    }
    check_transient_paths(&candidate_paths(config, entry)?, &protected)?;

    let lock_path = config.work_dir.join(LOCK_FILENAME);
    if force && remove_path(&lock_path)? {
        println!("Removed build lock {}.", lock_path.display());
    }
    let _lock = BuildLock::acquire(&lock_path)?;

    let paths = leftover_paths(config, entry)?;
    if paths.is_empty() {
        println!("No build state to clean.");
        return Ok(0);
    }

    let mut reclaimed = 0;
    for path in paths {
        let size = disk_usage(&path);
        println!("Removing {} ({})...", path.display(), human_size(size));
        remove_path(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        reclaimed += size;
    }

    println!("Clean complete ({} reclaimed).", human_size(reclaimed));
    Ok(reclaimed)
}

fn human_size(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes as f64 >= MB {
        format!("{:.1} MB", bytes as f64 / MB)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
