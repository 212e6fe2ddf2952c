//! Error types for console operations

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Error types for console operations
#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Backend returned {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Transport and HTTP status failures, as opposed to local mistakes
    pub fn is_network(&self) -> bool {
        matches!(self, ConsoleError::Http(_) | ConsoleError::Status { .. })
    }
}
