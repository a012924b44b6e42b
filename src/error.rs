//! Error types for the sync tool.

use thiserror::Error;

/// Errors that can occur during a course sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Credentials file missing, unreadable, or missing required keys
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// SIS API returned an unexpected status or payload
    #[error("SIS API error: {message}")]
    SisApi { message: String },

    /// A remote payload could not be decoded into the expected shape
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Directory API reported a problem or an unrecognized result code
    #[error("Directory error ({code}): {message}")]
    Directory { code: String, message: String },

    /// Temporal-position lookup yielded no terms
    #[error("No term found for temporal position {position:?}")]
    TermResolution { position: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    Url { message: String },
}

impl SyncError {
    /// Returns true if this error was raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(self, SyncError::Config { .. })
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::Url {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Config {
            message: err.to_string(),
        }
    }
}
