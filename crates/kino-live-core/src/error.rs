//! Error types for Kino Live Core

use thiserror::Error;

/// Result type alias for live playback operations
pub type Result<T> = std::result::Result<T, Error>;

/// Live playback and analytics error types
#[derive(Error, Debug)]
pub enum Error {
    // Analytics session errors
    #[error("Failed to start analytics session: {0}")]
    SessionStart(String),

    #[error("Failed to end analytics session {session_id}: {reason}")]
    SessionEnd { session_id: String, reason: String },

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Payload errors
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Runtime errors
    #[error("No async runtime available: {0}")]
    Runtime(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a session start error
    pub fn session_start(msg: impl Into<String>) -> Self {
        Error::SessionStart(msg.into())
    }

    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::SessionStart(_) => "SESSION_START",
            Error::SessionEnd { .. } => "SESSION_END",
            Error::Network(_) => "NETWORK",
            Error::HttpStatus { .. } => "HTTP_STATUS",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Decode(_) => "DECODE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Runtime(_) => "RUNTIME",
            Error::Storage(_) => "STORAGE",
            Error::Io(_) => "IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::session_start("boom").error_code(), "SESSION_START");
        assert_eq!(Error::InvalidConfig("x".into()).error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_recoverable() {
        let server = Error::HttpStatus { status: 503, url: "https://a".into() };
        let client = Error::HttpStatus { status: 404, url: "https://a".into() };
        assert!(server.is_recoverable());
        assert!(!client.is_recoverable());
        assert!(!Error::Storage("full".into()).is_recoverable());
    }
}
