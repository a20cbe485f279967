//! Gathering input lines from arguments and files.

use anyhow::{Context, Result};
use std::path::Path;

/// Positional URLs first, then the lines of `file` (if given), in order.
/// Filtering is left to the job store.
pub fn collect_lines(urls: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut lines = urls.to_vec();
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading URL list {}", path.display()))?;
        lines.extend(text.lines().map(str::to_string));
    }
    if lines.is_empty() {
        anyhow::bail!("no URLs given (pass them as arguments or with --file)");
    }
    Ok(lines)
}
