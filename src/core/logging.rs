//! Centralized logging configuration for stark_settlement
//!
//! Structured logging with the `tracing` crate:
//! - JSON output by default (parseable by log aggregation tools)
//! - Pretty output for development (`LOG_FORMAT=pretty`)
//! - Level filter via `RUST_LOG`
//! - Redaction helpers for key material and signatures
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | `stark_settlement=info` | Log level filter (standard tracing format) |
//! | `LOG_FORMAT` | `json` | Output format: `json` or `pretty` |
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use stark_settlement::core::logging::{init_logging, sanitize, sanitize_secret};
//!
//! init_logging();
//!
//! let private_key = "0x6db5a32178b49fea8da102feeef5bf4e1449af13a41b5f850173f109009f00a";
//! tracing::info!(private_key = %sanitize_secret(private_key), "Loaded signing key");
//! // Output: private_key = "REDACTED"
//!
//! let wallet = "0x0123456789abcdef0123456789abcdef01234567";
//! tracing::info!(wallet = %sanitize(wallet), "Onboarding");
//! // Output: wallet = "0x01...REDACTED"
//! ```

use std::env;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt as ts_fmt, fmt::format::FmtSpan, prelude::*, EnvFilter};

/// Flag to track if logging has been initialized (prevents double-init)
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "stark_settlement=info";

/// Field names that must never reach a log line in clear.
///
/// Wrap such values with `sanitize_secret()` or `sanitize_signature()`, and
/// add `skip(...)` to `#[instrument]` on functions taking them.
pub const SENSITIVE_FIELD_PATTERNS: &[&str] = &[
    "private_key",
    "secret",
    "signature",
    "eth_signature",
    "seed",
];

/// Wrapper for sensitive data that should be redacted in logs.
///
/// For identifiers (`new`), `Display` shows the first four characters of
/// values longer than eight characters followed by `...REDACTED`. Secrets
/// (`secret`) and short values are always fully redacted.
///
/// ```rust,ignore
/// let sanitized = SanitizedValue::new("0x0123456789ab");
/// assert_eq!(format!("{}", sanitized), "0x01...REDACTED");
/// assert_eq!(format!("{}", SanitizedValue::secret("0x6db5a32178b4")), "REDACTED");
/// ```
#[derive(Clone)]
pub struct SanitizedValue<'a> {
    value: &'a str,
    show_prefix: bool,
}

impl<'a> SanitizedValue<'a> {
    pub fn new(value: &'a str) -> Self {
        Self {
            value,
            show_prefix: true,
        }
    }

    /// Key material: nothing of the value is ever displayed
    pub fn secret(value: &'a str) -> Self {
        Self {
            value,
            show_prefix: false,
        }
    }

    /// The wrapped value, for actual processing only. Never log it.
    pub fn expose(&self) -> &str {
        self.value
    }
}

impl<'a> fmt::Display for SanitizedValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get(..4) {
            Some(prefix) if self.show_prefix && self.value.len() > 8 => {
                write!(f, "{}...REDACTED", prefix)
            }
            _ => write!(f, "REDACTED"),
        }
    }
}

impl<'a> fmt::Debug for SanitizedValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SanitizedValue(***)")
    }
}

pub fn sanitize(value: &str) -> SanitizedValue<'_> {
    SanitizedValue::new(value)
}

pub fn sanitize_secret(value: &str) -> SanitizedValue<'_> {
    SanitizedValue::secret(value)
}

/// Shorten a signature component to its first 8 characters.
pub fn sanitize_signature(sig: &str) -> String {
    match sig.get(..8) {
        Some(prefix) if sig.len() > 12 => format!("{}...", prefix),
        _ => "REDACTED".to_string(),
    }
}

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter string (e.g., "stark_settlement=debug")
    pub level_filter: String,
    /// Use pretty format instead of JSON
    pub use_pretty_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level_filter: DEFAULT_LOG_LEVEL.to_string(),
            use_pretty_format: false,
        }
    }
}

impl LoggingConfig {
    /// Read `RUST_LOG` and `LOG_FORMAT` from the environment
    pub fn from_env() -> Self {
        let level_filter = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        let use_pretty_format = env::var("LOG_FORMAT")
            .map(|v| v.to_lowercase() == "pretty")
            .unwrap_or(false);

        Self {
            level_filter,
            use_pretty_format,
        }
    }
}

/// Initialize logging from the environment. Subsequent calls are no-ops.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::from_env());
}

pub fn init_logging_with_config(config: LoggingConfig) {
    // Prevent double initialization
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    let env_filter = EnvFilter::try_new(&config.level_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if config.use_pretty_format {
        tracing_subscriber::registry()
            .with(
                ts_fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    } else {
        // stdout carries the JSON artifacts, so logs go to stderr
        tracing_subscriber::registry()
            .with(
                ts_fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
