//! Core module - signature engine and logging
//!
//! Prefer importing from `crate::core`:
//! ```ignore
//! use stark_settlement::core::{SignatureEngine, init_logging};
//! ```

pub mod engine;
pub mod logging;

// Explicit re-exports for engine module
pub use engine::{OnboardingBundle, OnboardingRequest, SignatureEngine, SignedOrder};

// Explicit re-exports for logging module
pub use logging::{
    init_logging, init_logging_with_config, sanitize, sanitize_secret, sanitize_signature,
    LoggingConfig, SanitizedValue, DEFAULT_LOG_LEVEL, SENSITIVE_FIELD_PATTERNS,
};
