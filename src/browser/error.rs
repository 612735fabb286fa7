//! Error types for page drivers.

use std::time::Duration;

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Errors surfaced by a [`PageDriver`](super::PageDriver).
#[derive(Debug, Error)]
pub enum DriverError {
    /// The browser process could not be configured or started.
    #[error("failed to launch browser: {message}")]
    Launch { message: String },

    /// A DevTools protocol call failed.
    #[error("browser {action} failed: {source}")]
    Cdp {
        action: &'static str,
        #[source]
        source: CdpError,
    },

    /// A page could not be loaded.
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// No element matched the selector.
    #[error("no element matches {selector}")]
    NotFound { selector: String },

    /// The selector did not match anything before the deadline.
    #[error("timed out after {timeout:?} waiting for {selector}")]
    Timeout { selector: String, timeout: Duration },

    /// A script result had an unexpected shape.
    #[error("unexpected script result: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

impl DriverError {
    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }

    pub fn cdp(action: &'static str, source: CdpError) -> Self {
        Self::Cdp { action, source }
    }

    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::NotFound {
            selector: selector.into(),
        }
    }

    pub fn timeout(selector: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            selector: selector.into(),
            timeout,
        }
    }

    /// True for [`DriverError::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_selector() {
        let err = DriverError::timeout("img.photo", Duration::from_secs(10));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out after 10s waiting for img.photo");
    }

    #[test]
    fn test_not_found_is_not_timeout() {
        let err = DriverError::not_found("#allsizes-photo img");
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("#allsizes-photo img"));
    }
}
