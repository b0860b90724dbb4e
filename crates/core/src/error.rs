//! Shared error type for the domain crate

use thiserror::Error;

/// Errors that can arise while constructing or validating domain entities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("amount must be positive")]
    NonPositiveAmount,

    /// An external collaborator (LLM, STT/TTS, job queue, notifier, object
    /// store) failed. The message is collaborator-specific; callers match on
    /// variant, not on message text.
    #[error("external collaborator error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
