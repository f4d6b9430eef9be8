//! Crate-wide error types.
//!
//! Library modules return [`Result`] with the [`Error`] enum below. None of
//! these errors ever reach the method-channel boundary: the channel handler
//! converts every failure into a degraded but successful response. The CLI
//! binary uses `anyhow` on top of this.

use std::path::PathBuf;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The locator could not be parsed into anything openable
    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The operation does not support the locator's scheme
    #[error("Unsupported scheme for {operation}: {locator}")]
    UnsupportedScheme { operation: &'static str, locator: String },

    /// Tag or container parsing error
    #[error("Metadata error for {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Remote stream could not be fetched
    #[error("Remote fetch failed for {url}: {message}")]
    Remote { url: String, message: String },

    /// A `content://` locator was given but the host injected no resolver
    #[error("No content resolver available for {0}")]
    NoContentResolver(String),

    /// Native library failed to load
    #[error("Failed to load library {name}: {message}")]
    Library { name: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn invalid_locator(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn remote(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_locator_display() {
        let err = Error::invalid_locator("file://", "empty path");
        let msg = err.to_string();
        assert!(msg.contains("file://"));
        assert!(msg.contains("empty path"));
    }

    #[test]
    fn test_unsupported_scheme_display() {
        let err = Error::UnsupportedScheme {
            operation: "format",
            locator: "https://example.com/a.mp3".to_string(),
        };
        assert!(err.to_string().contains("format"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::remote("https://example.com", "timeout").context("while opening stream");
        let msg = err.to_string();
        assert!(msg.contains("while opening stream"));
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let with_ctx = result.with_context("reading cover directory");
        assert!(
            with_ctx
                .unwrap_err()
                .to_string()
                .contains("reading cover directory")
        );
    }
}
