//! Summary of a finished build.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::timing::format_duration;

/// Duration of one stage, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub millis: u64,
}

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub entry: PathBuf,
    pub artifact: PathBuf,
    pub size_bytes: u64,
    pub sha256: String,
    pub stages: Vec<StageTiming>,
}

impl BuildReport {
    /// Describe `artifact`, hashing its contents.
    pub fn new(entry: &Path, artifact: &Path, stages: &[(&'static str, Duration)]) -> io::Result<Self> {
        Ok(Self {
            entry: entry.to_path_buf(),
            artifact: artifact.to_path_buf(),
            size_bytes: std::fs::metadata(artifact)?.len(),
            sha256: sha256_file(artifact)?,
            stages: stages
                .iter()
                .map(|(stage, elapsed)| StageTiming {
                    stage: stage.to_string(),
                    millis: elapsed.as_millis() as u64,
                })
                .collect(),
        })
    }

    /// Save report to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Print the summary to stdout.
    pub fn print(&self) {
        println!("=== Build Complete ===\n");
        println!("  Artifact: {}", self.artifact.display());
        println!("  Size:     {:.1} MB", self.size_bytes as f64 / (1024.0 * 1024.0));
        println!("  SHA256:   {}", self.sha256);
        println!();
        for timing in &self.stages {
            println!(
                "  [{}] {}",
                format_duration(Duration::from_millis(timing.millis)),
                timing.stage
            );
        }
    }
}

/// Streamed SHA256 of a file, hex-encoded.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello");
        std::fs::write(&path, "hello").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_report_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("hello");
        std::fs::write(&artifact, "binary").unwrap();

        let report = BuildReport::new(
            Path::new("hello.py"),
            &artifact,
            &[("packaging", Duration::from_millis(1200))],
        )
        .unwrap();
        assert_eq!(report.size_bytes, 6);
        assert_eq!(report.stages[0].millis, 1200);

        let json_path = dir.path().join("report.json");
        report.save(&json_path).unwrap();
        let loaded: BuildReport =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
