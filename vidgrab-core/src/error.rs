use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platforms::traits::Capability;
use crate::platforms::Platform;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid {platform} url: {url}")]
    InvalidUrl { platform: Platform, url: String },
    #[error("unsupported url: {0}")]
    UnsupportedUrl(String),
    #[error("{0} not supported for this URL")]
    NotSupported(Capability),
    #[error("authentication not supported for {0}")]
    AuthNotSupported(Platform),
    #[error("downloading from {0} is not implemented yet")]
    NotImplemented(Platform),
    #[error("failed to fetch media info: {0}")]
    Fetch(anyhow::Error),
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn fetch(err: impl Into<anyhow::Error>) -> Self {
        Self::Fetch(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::UnsupportedUrl(_) => ErrorKind::UnsupportedUrl,
            Self::NotSupported(_) => ErrorKind::NotSupported,
            Self::AuthNotSupported(_) => ErrorKind::AuthNotSupported,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::InvalidSchedule(_) => ErrorKind::InvalidSchedule,
            Self::Stream(_) => ErrorKind::Stream,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Flat mirror of [`DownloadError`] carried inside result records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    UnsupportedUrl,
    NotSupported,
    AuthNotSupported,
    NotImplemented,
    Fetch,
    InvalidSchedule,
    Stream,
    Io,
}

impl ErrorKind {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch | Self::Stream)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DownloadError> for ErrorDetail {
    fn from(err: &DownloadError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_supported_message_names_capability() {
        let err = DownloadError::NotSupported(Capability::Playlist);
        assert_eq!(err.to_string(), "Playlist not supported for this URL");
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn fetch_wraps_anyhow_message() {
        let err = DownloadError::fetch(anyhow::anyhow!("HTTP 404"));
        assert_eq!(err.to_string(), "failed to fetch media info: HTTP 404");
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn precondition_errors_are_not_retryable() {
        assert!(!ErrorKind::InvalidUrl.is_retryable());
        assert!(!ErrorKind::NotSupported.is_retryable());
        assert!(!ErrorKind::NotImplemented.is_retryable());
    }
}
