//! Error types for testdeck

use thiserror::Error;

/// Result type alias using testdeck Error
pub type Result<T> = std::result::Result<T, Error>;

/// testdeck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The outer response decoded, but the JSON string it carries did not.
    #[error("Embedded {field} payload is not valid instructions: {source}")]
    EmbeddedInstructions {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid image {path}: {reason}")]
    InvalidImage { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
