use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the acquisition pipeline.
///
/// Enrichment absence is not represented here: it is `Ok(None)` from
/// [`crate::enrichment::EnrichmentClient::fetch`].
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("could not resolve catalog endpoint: {0}")]
    Resolution(String),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("book {0} not found in catalog")]
    BookNotFound(i64),

    #[error("book {0} has no EPUB download link")]
    NoDownloadLink(i64),

    #[error("book {0} is not in the local library")]
    LibraryItemMissing(i64),

    #[error("book file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("could not read book file: {0}")]
    Parse(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("download cancelled")]
    Cancelled,

    #[error("local store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl AcquisitionError {
    /// Network-level failures, which the UI shows as a "no internet" state.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

pub type AcquisitionResult<T> = Result<T, AcquisitionError>;
