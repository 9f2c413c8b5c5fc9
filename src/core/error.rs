use std::io;
use thiserror::Error;

/// Unified error type for the assistant
#[derive(Error, Debug)]
pub enum AssistError {
    /// Missing credential or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generation API answered with an error or an unusable body
    #[error("API error: {0}")]
    Api(String),

    /// Transport-level failures talking to the generation API
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Uploaded document could not be accepted or read
    #[error("File error: {0}")]
    FileProcessing(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Coarse classification used by the orchestrator to decide what is recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal, only raised at startup.
    Configuration,
    /// Anything that went wrong inside a generation call.
    Generation,
    /// Upload path failures.
    FileProcessing,
    /// The chat runtime itself failed (terminal I/O, line editor).
    Runtime,
}

impl AssistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssistError::Config(_) => ErrorKind::Configuration,
            AssistError::Api(_) | AssistError::Network(_) | AssistError::Serialization(_) => {
                ErrorKind::Generation
            }
            AssistError::FileProcessing(_) => ErrorKind::FileProcessing,
            AssistError::Input(_) | AssistError::Io { .. } => ErrorKind::Runtime,
        }
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AssistError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AssistError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            AssistError::Api(format!("API returned error status: {}", err))
        } else if err.is_decode() {
            AssistError::Serialization(format!("Failed to decode response: {}", err))
        } else {
            AssistError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for AssistError {
    fn from(err: serde_json::Error) -> Self {
        AssistError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for AssistError {
    fn from(err: serde_yml::Error) -> Self {
        AssistError::Config(format!("YAML error: {}", err))
    }
}
