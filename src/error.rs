//! Hindsight error types

use thiserror::Error;

/// Hindsight error type
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound message rejected at ingest (missing or non-numeric fields)
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Record store unavailable or integrity violation on insert
    #[error("Storage fault: {0}")]
    Storage(String),

    /// Embedding provider failure during index or retrieve
    #[error("Embedding fault: {0}")]
    Embedding(String),

    /// A stored record failed to parse during retrieval
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Answer generation failed or timed out
    #[error("Synthesis fault: {0}")]
    Synthesis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Channel error
    #[error("Channel error: {0}")]
    Channel(String),

    /// Gateway error
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for hindsight operations
pub type Result<T> = std::result::Result<T, Error>;
