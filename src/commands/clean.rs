//! Clean command - removes leftover build state.

use anyhow::Result;
use std::path::Path;

use crate::clean;
use crate::config::Config;

/// Execute the clean command.
pub fn cmd_clean(config: &Config, entry: Option<&Path>, force: bool) -> Result<()> {
    clean::clean_build_state(config, entry, force)?;
    Ok(())
}
