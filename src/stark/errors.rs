//! Signature engine error types
//!
//! Every failure in the hashing/signing pipeline is one of these variants.
//! None of them are retried internally and no partial signature is ever
//! returned alongside an error.

use thiserror::Error;

/// Errors raised while encoding, hashing or signing a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Malformed or out-of-range input (bad hex, negative amount, missing field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The curve provider failed while hashing or signing
    #[error("Signing failed in provider {provider}: {reason}")]
    Signing { provider: String, reason: String },

    /// A signature component failed the local sanity check
    #[error("Verification mismatch: {0}")]
    VerificationMismatch(String),

    /// No acceptable curve provider could be resolved at startup
    #[error("No curve provider available: {0}")]
    ProviderUnavailable(String),
}

impl SignatureError {
    /// Shorthand for a validation failure on a named field
    pub fn invalid(field: &str, reason: impl std::fmt::Display) -> Self {
        SignatureError::Validation(format!("{}: {}", field, reason))
    }

    /// Shorthand for a missing required field
    pub fn missing(field: &str) -> Self {
        SignatureError::Validation(format!("missing required field '{}'", field))
    }
}

/// Result type alias for signature operations
pub type SignatureResult<T> = std::result::Result<T, SignatureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = SignatureError::Validation("bad hex".to_string());
        assert_eq!(err.to_string(), "Validation error: bad hex");
    }

    #[test]
    fn test_invalid_helper_includes_field() {
        let err = SignatureError::invalid("price", "must be positive");
        assert_eq!(err.to_string(), "Validation error: price: must be positive");
    }

    #[test]
    fn test_missing_helper() {
        let err = SignatureError::missing("salt");
        assert_eq!(
            err.to_string(),
            "Validation error: missing required field 'salt'"
        );
    }

    #[test]
    fn test_signing_display() {
        let err = SignatureError::Signing {
            provider: "starknet-crypto".to_string(),
            reason: "InvalidMessageHash".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Signing failed in provider starknet-crypto: InvalidMessageHash"
        );
    }

    #[test]
    fn test_provider_unavailable_display() {
        let err = SignatureError::ProviderUnavailable("hmac".to_string());
        assert_eq!(err.to_string(), "No curve provider available: hmac");
    }
}
