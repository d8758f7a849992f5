//! Application-wide error types using thiserror
//!
//! Signing failures keep their own taxonomy (`SignatureError`); everything
//! the surrounding application adds (config, IO, JSON) is wrapped here.

use thiserror::Error;

use crate::stark::errors::SignatureError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_error_converts() {
        fn fails() -> Result<()> {
            Err(SignatureError::missing("nonce"))?
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, AppError::Signature(SignatureError::Validation(_))));
        assert_eq!(
            err.to_string(),
            "Signature error: Validation error: missing required field 'nonce'"
        );
    }
}
