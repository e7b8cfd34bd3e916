//! Error handling for the OI.Share remote driver

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client error (connection refused, timeout, body read failure)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error (UDP socket bind/receive, image persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Camera answered with a non-200 status
    #[error("Camera rejected {command}: status {status}")]
    Protocol { command: String, status: u16 },

    /// Camera answered from a different path than requested
    #[error("Request unsuccessful: expected path {expected}, got {actual}")]
    UnexpectedPath { expected: String, actual: String },

    /// Nothing to do in the current camera mode
    #[error("No action available: {0}")]
    NoAction(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Transport and protocol failures, i.e. the camera could not be reached
    /// or refused the command.
    pub fn is_camera_failure(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Protocol { .. } | Error::UnexpectedPath { .. }
        )
    }
}
