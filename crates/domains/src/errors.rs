//! # DomainError
//!
//! Centralized error handling for the playback relay.
//! Maps pipeline failures to the categories callers act on.

use thiserror::Error;

/// The primary error type for all domain and port operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or ineligible payload (e.g., missing Metadata, unsupported library)
    #[error("validation error: {0}")]
    Validation(String),

    /// Nothing cached under the requested key
    #[error("{0} not found")]
    NotFound(String),

    /// Image bytes could not be decoded or encoded
    #[error("image error: {0}")]
    Image(String),

    /// Infrastructure failure (e.g., cache store down, location service timeout)
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// Outbound notification could not be delivered or queued
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Anything else: corrupt state, panicked worker tasks
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn infrastructure(msg: impl Into<String>) -> Self {
        Self::Infrastructure(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }
}

/// A specialized Result type for relay logic.
pub type Result<T> = std::result::Result<T, DomainError>;
