//! Persistence layer for the video feed
//!
//! Provides the flat text report that the poller overwrites every cycle.

pub mod report;

pub use report::{render_report, ReportEntry, ReportFile};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report directory error: {0}")]
    Directory(String),

    #[error("Report write error: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;
