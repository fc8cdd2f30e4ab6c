use std::path::PathBuf;

use thiserror::Error;

use crate::chat::TurnId;

/// Errors from the message lifecycle controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("turn {0} not found")]
    TurnNotFound(TurnId),
}

/// Errors while loading relay configuration or credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no upstream credential set (checked {checked})")]
    MissingCredential { checked: String },

    #[error("no candidate models configured")]
    NoModels,
}

/// Errors from the relay HTTP client.
#[derive(Debug, Error)]
pub enum RelayClientError {
    #[error("invalid relay endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("relay unreachable: {0}")]
    Transport(String),

    #[error("relay returned HTTP {status}")]
    Status { status: u16 },

    #[error("relay stream broke: {0}")]
    Stream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_lists_checked_names() {
        let err = ConfigError::MissingCredential {
            checked: "GEMINI_API_KEY, API_KEY".into(),
        };
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_relay_status_display() {
        let err = RelayClientError::Status { status: 502 };
        assert_eq!(err.to_string(), "relay returned HTTP 502");
    }
}
