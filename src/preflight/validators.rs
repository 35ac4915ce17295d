//! Content validation for build inputs.
//!
//! An empty manifest or an empty script passes `.exists()` but produces a
//! useless executable, so these read the files.

use std::path::Path;

/// Validate a pip requirements manifest. Returns the number of requirements.
///
/// Blank lines and `#` comments are ignored. An empty manifest is valid for
/// pip, so the caller decides whether zero is worth a warning.
pub fn validate_manifest(path: &Path) -> Result<usize, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("Cannot read: {}", e))?;

    let mut count = 0;
    for (lineno, line) in content.lines().enumerate() {
        let line = line.split(" #").next().unwrap_or_default().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Options pip understands but that need an argument
        if matches!(line, "-r" | "-c" | "-e" | "--requirement" | "--constraint") {
            return Err(format!("line {}: '{}' is missing its argument", lineno + 1, line));
        }
        count += 1;
    }

    Ok(count)
}

/// Validate an entry-point script. Returns its line count.
pub fn validate_entry_point(path: &Path) -> Result<usize, String> {
    if !path.is_file() {
        return Err("Not found".to_string());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read as UTF-8 text: {}", e))?;

    if content.trim().is_empty() {
        return Err("File is empty - nothing to package".to_string());
    }

    Ok(content.lines().count())
}

/// Whether the file name looks like a Python script.
pub fn has_python_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyw")
    )
}
