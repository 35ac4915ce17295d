//! Host interpreter checks.

use crate::config::Config;
use crate::process::{self, Cmd};

use super::types::CheckResult;

/// Check the host interpreter can create a venv.
pub fn check_host_tools(config: &Config) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let python = &config.python;
    match process::which(python) {
        Some(path) => results.push(CheckResult::pass_with(python, &path.display().to_string())),
        None => {
            results.push(CheckResult::fail(
                python,
                "Not found on PATH. Install Python 3 or set PYBUNDLE_PYTHON.",
            ));
            results.push(CheckResult::skip("venv module", "no interpreter"));
            return results;
        }
    }

    results.push(check_venv_module(python));
    results
}

/// `python -m venv --help` succeeds only if the venv module is installed.
fn check_venv_module(python: &str) -> CheckResult {
    let version = Cmd::new(python)
        .arg("--version")
        .allow_fail()
        .run()
        .ok()
        .filter(|r| r.success())
        .map(|r| {
            // Python 2 printed its version to stderr
            let out = r.stdout_trimmed();
            if out.is_empty() {
                r.stderr_trimmed().to_string()
            } else {
                out.to_string()
            }
        });

    match Cmd::new(python).args(["-m", "venv", "--help"]).allow_fail().run() {
        Ok(result) if result.success() => {
            CheckResult::pass_with("venv module", version.as_deref().unwrap_or("available"))
        }
        Ok(_) => CheckResult::fail(
            "venv module",
            "Not available. Install the venv package for your interpreter (e.g. python3-venv).",
        ),
        Err(e) => CheckResult::fail("venv module", &format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::types::CheckStatus;
    use std::collections::HashMap;
    use std::path::Path;

    #[test]
    fn test_missing_interpreter_fails_and_skips_venv() {
        let mut config = Config::from_vars(Path::new("/work"), &HashMap::new()).unwrap();
        config.python = "nonexistent_python_12345".to_string();

        let results = check_host_tools(&config);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, CheckStatus::Fail);
        assert_eq!(results[1].status, CheckStatus::Skip);
    }

    #[cfg(unix)]
    #[test]
    fn test_interpreter_without_venv_module_fails() {
        // `false` exists on PATH but rejects every invocation
        let mut config = Config::from_vars(Path::new("/work"), &HashMap::new()).unwrap();
        config.python = "false".to_string();

        let results = check_host_tools(&config);

        assert_eq!(results[0].status, CheckStatus::Pass);
        assert_eq!(results[1].status, CheckStatus::Fail);
    }
}
