// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Transport failures, timeouts included

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // Anything other than 200 OK

    #[error("Report not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF parsing error: {0}")]
    Pdf(String),

    #[error("Document contains no extractable text")]
    NoText,
}

/// Failures raised by the pluggable analysis capabilities.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Sentiment scoring failed: {0}")]
    Sentiment(String),

    #[error("Topic modelling failed: {0}")]
    Topic(String),

    #[error("Embedding lookup failed: {0}")]
    Embedding(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Analysis capability failed: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
