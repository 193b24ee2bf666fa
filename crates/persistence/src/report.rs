//! Video report file: rendered as plain text and overwritten on every scan

use crate::{ReportError, ReportResult};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One video block in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub title: String,
    pub date: NaiveDate,
    pub link: String,
    pub source: String,
}

/// Render the report text: a scan header, then one block per entry.
///
/// With no entries the header is followed by a single "no new videos" line
/// mentioning the lookback window.
pub fn render_report(
    scanned_at: NaiveDateTime,
    lookback_days: u32,
    entries: &[ReportEntry],
) -> String {
    let mut out = format!("Scanned at: {}\n\n", scanned_at.format("%Y-%m-%d %H:%M:%S"));

    if entries.is_empty() {
        out.push_str(&format!("No new videos in the last {} days.\n", lookback_days));
        return out;
    }

    for entry in entries {
        out.push_str(&format!(
            "Title: {}\nDate: {}\nLink: {}\nSource: {}\n\n",
            entry.title,
            entry.date.format("%Y-%m-%d"),
            entry.link,
            entry.source
        ));
    }
    out
}

/// Output file that holds only the latest scan
pub struct ReportFile {
    path: PathBuf,
}

impl ReportFile {
    /// Create the report handle, creating parent directories if needed
    pub fn new(path: impl AsRef<Path>) -> ReportResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ReportError::Directory(format!("{}: {e}", parent.display())))?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with a freshly rendered report
    pub async fn overwrite(
        &self,
        scanned_at: NaiveDateTime,
        lookback_days: u32,
        entries: &[ReportEntry],
    ) -> ReportResult<()> {
        let text = render_report(scanned_at, lookback_days, entries);
        tokio::fs::write(&self.path, text.as_bytes())
            .await
            .map_err(|source| ReportError::Write {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(path = %self.path.display(), entries = entries.len(), "Report written");
        Ok(())
    }
}
