//! Result file and result log output
//!
//! Both outputs are written to staging files next to the final result file
//! (`result_new.txt`, `result_new.log`) while the run is in progress, and
//! renamed over their final names once it completes. An interrupted run
//! leaves the previous results in place.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::{ChannelUrlsResult, ScoredCandidate, DATE_FORMAT};
use crate::storage::seed::GENRE_MARKER;

/// Staging name of the result file
pub const STAGING_RESULT_FILE: &str = "result_new.txt";

/// Staging name of the result log
pub const STAGING_LOG_FILE: &str = "result_new.log";

/// Final result log name
pub const RESULT_LOG_FILE: &str = "result.log";

/// Final result log name when a user configuration was used
pub const USER_RESULT_LOG_FILE: &str = "user_result.log";

/// Staging and final locations of the run outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub staging_result: PathBuf,
    pub final_result: PathBuf,
    pub staging_log: PathBuf,
    pub final_log: PathBuf,
}

impl OutputPaths {
    /// Lay out the outputs in the directory of `final_file`
    pub fn new(final_file: &Path, user_config: bool) -> Self {
        let dir = match final_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let log_name = if user_config {
            USER_RESULT_LOG_FILE
        } else {
            RESULT_LOG_FILE
        };

        Self {
            staging_result: dir.join(STAGING_RESULT_FILE),
            final_result: final_file.to_path_buf(),
            staging_log: dir.join(STAGING_LOG_FILE),
            final_log: dir.join(log_name),
        }
    }
}

/// Render one category block
///
/// `CATEGORY,#genre#`, one `NAME,URL` line per URL, then a blank line.
pub fn render_category(category: &str, channels: &[ChannelUrlsResult]) -> String {
    let mut block = format!("{category},{GENRE_MARKER}\n");
    for channel in channels {
        for url in &channel.urls {
            block.push_str(&channel.name);
            block.push(',');
            block.push_str(url);
            block.push('\n');
        }
    }
    block.push('\n');
    block
}

/// Appends category blocks to the staging result file
#[derive(Debug)]
pub struct ResultWriter {
    staging_path: PathBuf,
}

impl ResultWriter {
    /// Start a fresh staging file, discarding leftovers of an earlier run
    pub fn create(staging_path: &Path) -> Result<Self> {
        if let Some(parent) = staging_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }

        File::create(staging_path).with_context(|| {
            format!("Failed to create result file: {}", staging_path.display())
        })?;

        Ok(Self {
            staging_path: staging_path.to_path_buf(),
        })
    }

    /// Append one category block
    pub fn write_category(&self, category: &str, channels: &[ChannelUrlsResult]) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.staging_path)
            .with_context(|| {
                format!("Failed to open result file: {}", self.staging_path.display())
            })?;

        file.write_all(render_category(category, channels).as_bytes())
            .with_context(|| {
                format!("Failed to write result file: {}", self.staging_path.display())
            })?;

        tracing::debug!(category, channels = channels.len(), "Wrote category block");
        Ok(())
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Move the staging file over `final_path`
    pub fn promote(self, final_path: &Path) -> Result<()> {
        promote(&self.staging_path, final_path)
    }
}

/// Format one result log line
pub fn format_log_line(channel_name: &str, candidate: &ScoredCandidate) -> String {
    let c = &candidate.candidate;
    let matched = c.source_channel_name.as_deref().unwrap_or(channel_name);
    let date = c
        .observed_date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| String::from("None"));
    let resolution = c
        .resolution
        .map(|r| r.to_string())
        .unwrap_or_else(|| String::from("None"));

    format!(
        "Name: {channel_name}, URL_NAME: {matched}, URL: {}, Date: {date}, Resolution: {resolution}, Response Time: {}ms",
        c.url(),
        candidate.cost.round()
    )
}

/// Per-candidate log of ranked results
pub struct ResultLog {
    writer: BufWriter<File>,
    staging_path: PathBuf,
}

impl ResultLog {
    /// Start a fresh staging log
    pub fn create(staging_path: &Path) -> Result<Self> {
        let file = File::create(staging_path).with_context(|| {
            format!("Failed to create result log: {}", staging_path.display())
        })?;

        Ok(Self {
            writer: BufWriter::new(file),
            staging_path: staging_path.to_path_buf(),
        })
    }

    /// Log every ranked candidate of a channel
    pub fn record(&mut self, channel_name: &str, ranked: &[ScoredCandidate]) -> Result<()> {
        for candidate in ranked {
            writeln!(self.writer, "{}", format_log_line(channel_name, candidate))
                .with_context(|| {
                    format!("Failed to write result log: {}", self.staging_path.display())
                })?;
        }
        Ok(())
    }

    /// Flush and move the staging log over `final_path`
    pub fn promote(mut self, final_path: &Path) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush result log: {}", self.staging_path.display()))?;
        drop(self.writer);
        promote(&self.staging_path, final_path)
    }
}

/// Rename `staging` over `final_path` when the staging file exists
pub fn promote(staging: &Path, final_path: &Path) -> Result<()> {
    if !staging.exists() {
        tracing::warn!(path = %staging.display(), "Nothing to promote");
        return Ok(());
    }

    fs::rename(staging, final_path).with_context(|| {
        format!(
            "Failed to move {} to {}",
            staging.display(),
            final_path.display()
        )
    })?;

    tracing::info!(path = %final_path.display(), "Promoted output file");
    Ok(())
}
