use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PapersError {
    #[error("invalid form level: {0} (expected 1-5)")]
    InvalidForm(String),

    #[error("invalid manifest url: {0}")]
    InvalidManifestUrl(String),

    #[error("paper not found: {0}")]
    PaperNotFound(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("manifest request failed: {0}")]
    ManifestHttp(String),

    #[error("manifest endpoint returned status {status}: {message}")]
    ManifestStatus { status: u16, message: String },

    #[error("failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("download request failed: {0}")]
    DownloadHttp(String),

    #[error("download failed with status {status}: {message}")]
    DownloadStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("invalid material submission: {0}")]
    InvalidMaterial(String),
}

impl PapersError {
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            PapersError::ManifestHttp(_)
                | PapersError::ManifestStatus { .. }
                | PapersError::DownloadHttp(_)
                | PapersError::DownloadStatus { .. }
        )
    }
}
