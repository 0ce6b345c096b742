//! use certmint::error::MintError;

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur while minting a certificate.
///
/// Every variant is terminal to the current operation; nothing is retried
/// internally.
#[derive(Debug, Error)]
pub enum MintError {
    /// Caller-supplied identity or request data is unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The CA certificate or key could not be parsed, or they do not belong together.
    #[error("Invalid CA credential: {0}")]
    InvalidCaCredential(String),

    /// The subject attribute list is empty or malformed.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Error during key pair generation.
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// The CA key could not sign the certificate body.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// A DN field or extension could not be serialized.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// An output file already exists and would be overwritten.
    #[error("Output file exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Filesystem error in the persistence layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MintError>;

impl From<der::Error> for MintError {
    /// Converts a `der::Error` into an `EncodingFailed` error.
    fn from(err: der::Error) -> Self {
        MintError::EncodingFailed(err.to_string())
    }
}

impl From<rsa::Error> for MintError {
    fn from(err: rsa::Error) -> Self {
        MintError::KeyGenerationFailed(err.to_string())
    }
}
