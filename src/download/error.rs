//! Error types for the download module.
//!
//! `Display` carries the full context for logs. The failure ledger gets the
//! shorter [`DownloadError::ledger_message`], since it keeps the URL in its own
//! column.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching or writing one asset.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout { url: String },

    /// Any non-200 response other than 429.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus { url: String, status: u16 },

    /// File system error while writing the asset.
    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// The written file was not larger than the validity threshold and was removed.
    #[error("file too small: {path} is {bytes} bytes (must exceed {minimum})")]
    Undersized {
        path: PathBuf,
        bytes: u64,
        minimum: u64,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an undersized-file error.
    pub fn undersized(path: impl Into<PathBuf>, bytes: u64, minimum: u64) -> Self {
        Self::Undersized {
            path: path.into(),
            bytes,
            minimum,
        }
    }

    /// Returns true for errors caused by the transport rather than the response.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Short cause for the failure ledger, which keeps the URL in its own column.
    #[must_use]
    pub fn ledger_message(&self) -> String {
        match self {
            Self::Network { source, .. } => {
                let kind = if source.is_connect() {
                    "connection failed"
                } else if source.is_body() || source.is_decode() {
                    "body read failed"
                } else if source.is_redirect() {
                    "redirect error"
                } else {
                    "request failed"
                };
                format!("network error: {kind}")
            }
            Self::Timeout { .. } => "timeout".to_string(),
            Self::HttpStatus { status, .. } => format!("HTTP {status}"),
            Self::Io { source, .. } => format!("IO error: {source}"),
            Self::InvalidUrl { .. } => "invalid URL".to_string(),
            Self::Undersized { bytes, minimum, .. } => {
                format!("file too small: {bytes} bytes (must exceed {minimum})")
            }
        }
    }
}
