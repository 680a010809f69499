//! Error types for Autobot

use thiserror::Error;

/// Result type alias for Autobot operations
pub type Result<T> = std::result::Result<T, AutobotError>;

/// Main error type for Autobot
#[derive(Error, Debug)]
pub enum AutobotError {
    /// Source unreachable or authentication failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Empty listing, missing file, lookup miss or empty log
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Hash error: {0}")]
    Hash(String),

    /// Index inconsistency, clear failure or persistence failure
    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Parse failures, split by whether the run can continue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A single record is unusable; it is skipped and counted
    #[error("recoverable: {0}")]
    Recoverable(String),

    /// The export itself is compromised; the run is aborted
    #[error("fatal: {0}")]
    Fatal(String),
}

impl AutobotError {
    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            AutobotError::Connection(_) => "CONNECTION_ERROR",
            AutobotError::NotFound(_) => "NOT_FOUND",
            AutobotError::Parse(_) => "PARSE_ERROR",
            AutobotError::Hash(_) => "HASH_ERROR",
            AutobotError::Store(_) => "STORE_ERROR",
            AutobotError::Config(_) => "CONFIG_ERROR",
            AutobotError::Io(_) => "IO_ERROR",
            AutobotError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AutobotError::NotFound(_))
    }

    /// Whether this error aborts a whole sync run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AutobotError::Parse(ParseError::Recoverable(_)) | AutobotError::Hash(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AutobotError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(
            AutobotError::Parse(ParseError::Fatal("bad xml".into())).code(),
            "PARSE_ERROR"
        );
        assert_eq!(AutobotError::Store("boom".into()).code(), "STORE_ERROR");
    }

    #[test]
    fn test_recoverable_errors_are_not_fatal() {
        assert!(!AutobotError::Parse(ParseError::Recoverable("date".into())).is_fatal());
        assert!(!AutobotError::Hash("overflow".into()).is_fatal());
        assert!(AutobotError::Parse(ParseError::Fatal("xml".into())).is_fatal());
        assert!(AutobotError::Connection("refused".into()).is_fatal());
    }
}
