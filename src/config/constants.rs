//! Engine-wide defaults
//!
//! Values that callers may want to tune without a config file. Each can be
//! overridden via an environment variable; unparseable values fall back to
//! the default.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::stark::provider::STARKNET_CRYPTO;

// =============================================================================
// Order Defaults
// =============================================================================

/// Lifetime of an order with no explicit expiry (default: 3600 seconds)
///
/// Environment variable: `ORDER_TTL_SECS`
pub fn order_ttl_secs() -> u64 {
    std::env::var("ORDER_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600)
}

/// Fee rate applied when a request carries none (default: 0.001)
///
/// Environment variable: `DEFAULT_FEE_RATE`
pub fn default_fee_rate() -> Decimal {
    std::env::var("DEFAULT_FEE_RATE")
        .ok()
        .and_then(|s| Decimal::from_str(s.trim()).ok())
        .unwrap_or_else(|| Decimal::new(1, 3))
}

// =============================================================================
// Provider Selection
// =============================================================================

/// Ordered curve provider preference (default: `starknet-crypto`)
///
/// Environment variable: `CURVE_PROVIDERS` (comma separated)
pub fn curve_providers() -> Vec<String> {
    std::env::var("CURVE_PROVIDERS")
        .ok()
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| vec![STARKNET_CRYPTO.to_string()])
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for startup logs)
pub fn log_configuration() {
    tracing::info!("=== Signature Engine Defaults ===");
    tracing::info!("  - Order TTL: {}s", order_ttl_secs());
    tracing::info!("  - Default fee rate: {}", default_fee_rate());
    tracing::info!("  - Curve providers: {:?}", curve_providers());
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_default_values() {
        assert_eq!(order_ttl_secs(), 3600);
        assert_eq!(default_fee_rate(), Decimal::from_str("0.001").unwrap());
        assert_eq!(curve_providers(), vec!["starknet-crypto".to_string()]);
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("ORDER_TTL_SECS", "120");
        std::env::set_var("DEFAULT_FEE_RATE", "0.0005");
        std::env::set_var("CURVE_PROVIDERS", "native-binding, starknet-crypto");

        assert_eq!(order_ttl_secs(), 120);
        assert_eq!(default_fee_rate(), Decimal::from_str("0.0005").unwrap());
        assert_eq!(
            curve_providers(),
            vec!["native-binding".to_string(), "starknet-crypto".to_string()]
        );

        std::env::remove_var("ORDER_TTL_SECS");
        std::env::remove_var("DEFAULT_FEE_RATE");
        std::env::remove_var("CURVE_PROVIDERS");
    }

    #[test]
    #[serial(env)]
    fn test_unparseable_override_falls_back() {
        std::env::set_var("ORDER_TTL_SECS", "soon");
        std::env::set_var("CURVE_PROVIDERS", " , ");

        assert_eq!(order_ttl_secs(), 3600);
        assert_eq!(curve_providers(), vec!["starknet-crypto".to_string()]);

        std::env::remove_var("ORDER_TTL_SECS");
        std::env::remove_var("CURVE_PROVIDERS");
    }
}
