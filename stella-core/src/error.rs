//! Error types for stella-core

use thiserror::Error;

/// Main error type for the stella-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Local store error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Assessment definition failed validation
    #[error("invalid assessment definition: {0}")]
    InvalidDefinition(String),

    /// Answer recorded for a question id the definition does not contain
    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    /// Answer value does not fit the question kind
    #[error("invalid answer for {question_id}: {reason}")]
    InvalidAnswer { question_id: String, reason: String },

    /// Submission attempted before the last section was finished
    #[error("assessment is not complete")]
    NotComplete,

    /// Submission endpoint error
    #[error("submission error: {0}")]
    Submission(String),

    /// Guidance backend error
    #[error("guidance error: {0}")]
    Guidance(String),

    /// Training module not found in the catalog
    #[error("training module not found: {0}")]
    UnknownModule(String),
}

impl Error {
    /// Whether a network error is transient and worth retrying.
    ///
    /// Transport failures and 5xx responses are transient; 4xx and decoding
    /// failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Submission(msg) | Error::Guidance(msg) => {
                // Only the prefix is classified; response bodies may say anything
                msg.starts_with("request failed")
                    || msg
                        .strip_prefix("API error (")
                        .is_some_and(|rest| rest.starts_with('5'))
            }
            _ => false,
        }
    }
}

/// Result type alias for stella-core
pub type Result<T> = std::result::Result<T, Error>;
