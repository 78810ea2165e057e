//! Shared error types for the services crate.

use thiserror::Error;

use companion_core::model::{LabelError, SettingsError};

/// Errors emitted by `CompletionRecorder`.
///
/// An already-recorded label is a normal outcome, not an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecorderError {
    #[error(transparent)]
    Label(#[from] LabelError),
}

/// Errors emitted while reading the remote mirror.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("invalid remote URL: {0}")]
    InvalidUrl(String),
    #[error("remote request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("remote returned {content_type} instead of CSV")]
    UnexpectedContent { content_type: String },
    #[error("malformed CSV at line {line}: {reason}")]
    MalformedCsv { line: usize, reason: &'static str },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by remote write-back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("sheet endpoint cannot be built from {0}")]
    InvalidEndpoint(String),
    #[error("sheet update failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by reminder notifiers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("webhook responded with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{failed} of {total} notifiers failed")]
    Partial { failed: usize, total: usize },
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
