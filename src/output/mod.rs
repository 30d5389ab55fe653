pub mod formatter;

pub use formatter::{
    format_assessment, format_duration, format_json, format_score, format_summary_table, format_tsv,
    format_window, should_use_colors, Severity,
};

use anyhow::{Context, Result};
use std::path::Path;

use crate::fetch::ProfileOutcome;

/// Write the JSON report for a batch to `path`, replacing any previous report atomically.
pub fn write_json_report(path: &Path, outcomes: &[ProfileOutcome]) -> Result<()> {
    let json = format_json(outcomes).context("Failed to serialize report")?;
    crate::config::init::write_atomic(path, &json)?;
    tracing::debug!("Wrote report for {} profiles to {}", outcomes.len(), path.display());
    Ok(())
}
