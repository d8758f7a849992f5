//! Configuration types for the signature engine
//!
//! Loaded from YAML once at startup. Credentials never live here; they are
//! read from the environment by the binary.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extended::domain::{Network, SigningDomain};
use crate::extended::order::EXTENDED_EXPIRY_OFFSET_SECONDS;
use crate::stark::field::parse_hex_felt;

use super::constants;

// ============================================================================
// Defaults
// ============================================================================

fn default_providers() -> Vec<String> {
    constants::curve_providers()
}

fn default_expiry_offset_secs() -> u64 {
    EXTENDED_EXPIRY_OFFSET_SECONDS
}

fn default_order_ttl_secs() -> u64 {
    constants::order_ttl_secs()
}

fn default_fee_rate() -> Decimal {
    constants::default_fee_rate()
}

fn default_registry_version() -> String {
    crate::extended::assets::BUILTIN_REGISTRY_VERSION.to_string()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Order signing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Seconds added to the expiry before it is hashed (exchange compatibility)
    #[serde(default = "default_expiry_offset_secs")]
    pub expiry_offset_secs: u64,
    /// Lifetime of an order whose request carries no expiry
    #[serde(default = "default_order_ttl_secs")]
    pub order_ttl_secs: u64,
    /// Fee rate used when a request carries none (fraction, e.g. "0.001")
    #[serde(default = "default_fee_rate")]
    pub default_fee_rate: Decimal,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            expiry_offset_secs: default_expiry_offset_secs(),
            order_ttl_secs: default_order_ttl_secs(),
            default_fee_rate: default_fee_rate(),
        }
    }
}

impl SigningConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.order_ttl_secs == 0 {
            return Err(AppError::Config(
                "signing.order_ttl_secs must be > 0".to_string(),
            ));
        }

        // Rule: fee rate is a fraction in [0, 1)
        if self.default_fee_rate < Decimal::ZERO || self.default_fee_rate >= Decimal::ONE {
            return Err(AppError::Config(format!(
                "signing.default_fee_rate must be in [0, 1), got {}",
                self.default_fee_rate
            )));
        }

        Ok(())
    }
}

/// Per-network deployment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub domain: SigningDomain,
    pub onboarding_contract: String,
    /// Symbol to hex asset id
    pub assets: BTreeMap<String, String>,
}

impl NetworkConfig {
    pub fn validate(&self, network: Network) -> Result<(), AppError> {
        self.domain.validate().map_err(|e| {
            AppError::Config(format!("networks.{}.domain: {}", network, e))
        })?;

        parse_hex_felt("onboarding_contract", &self.onboarding_contract).map_err(|e| {
            AppError::Config(format!("networks.{}: {}", network, e))
        })?;

        if self.assets.is_empty() {
            return Err(AppError::Config(format!(
                "networks.{}.assets must list at least one asset",
                network
            )));
        }
        for (symbol, id) in &self.assets {
            parse_hex_felt(symbol, id).map_err(|e| {
                AppError::Config(format!("networks.{}.assets: {}", network, e))
            })?;
        }

        Ok(())
    }
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Network used when a caller does not name one
    pub network: Network,
    /// Curve provider preference, first available wins
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    #[serde(default)]
    pub signing: SigningConfig,
    /// Version tag of the asset table in `networks`
    #[serde(default = "default_registry_version")]
    pub registry_version: String,
    /// Overrides of the built-in deployment tables; empty means built-in
    #[serde(default)]
    pub networks: BTreeMap<Network, NetworkConfig>,
}

impl EngineConfig {
    /// Built-in tables, default signing parameters
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            providers: default_providers(),
            signing: SigningConfig::default(),
            registry_version: default_registry_version(),
            networks: BTreeMap::new(),
        }
    }

    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        // Rule: at least one provider must be named
        if self.providers.iter().all(|p| p.trim().is_empty()) {
            return Err(AppError::Config(
                "providers must name at least one curve provider".to_string(),
            ));
        }

        self.signing.validate()?;

        if self.registry_version.trim().is_empty() {
            return Err(AppError::Config(
                "registry_version cannot be empty".to_string(),
            ));
        }

        for (network, profile) in &self.networks {
            profile.validate(*network)?;
        }

        // Rule: the default network must be resolvable
        if !self.networks.is_empty() && !self.networks.contains_key(&self.network) {
            return Err(AppError::Config(format!(
                "network '{}' is not listed under networks",
                self.network
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::str::FromStr;

    fn network_config() -> NetworkConfig {
        NetworkConfig {
            domain: SigningDomain::for_network(Network::Sepolia),
            onboarding_contract: "0x4718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d"
                .to_string(),
            assets: BTreeMap::from([(
                "BTC".to_string(),
                "0x4254432d3600000000000000000000".to_string(),
            )]),
        }
    }

    #[test]
    #[serial(env)]
    fn test_builtin_config_is_valid() {
        assert!(EngineConfig::for_network(Network::Sepolia).validate().is_ok());
    }

    #[test]
    #[serial(env)]
    fn test_empty_providers_rejected() {
        let mut config = EngineConfig::for_network(Network::Sepolia);
        config.providers = vec!["  ".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("providers"));
    }

    #[test]
    #[serial(env)]
    fn test_fee_rate_bounds() {
        let mut signing = SigningConfig::default();
        signing.default_fee_rate = Decimal::from_str("-0.01").unwrap();
        assert!(signing.validate().is_err());

        signing.default_fee_rate = Decimal::ONE;
        assert!(signing.validate().is_err());

        signing.default_fee_rate = Decimal::ZERO;
        assert!(signing.validate().is_ok());
    }

    #[test]
    #[serial(env)]
    fn test_zero_ttl_rejected() {
        let mut signing = SigningConfig::default();
        signing.order_ttl_secs = 0;
        assert!(signing.validate().is_err());
    }

    #[test]
    #[serial(env)]
    fn test_network_config_validation() {
        assert!(network_config().validate(Network::Sepolia).is_ok());

        let mut bad_asset = network_config();
        bad_asset.assets.insert("ETH".to_string(), "0xnothex".to_string());
        assert!(bad_asset.validate(Network::Sepolia).is_err());

        let mut no_assets = network_config();
        no_assets.assets.clear();
        assert!(no_assets.validate(Network::Sepolia).is_err());

        let mut bad_domain = network_config();
        bad_domain.domain.name = "a name that is far too long for a short string".to_string();
        assert!(bad_domain.validate(Network::Sepolia).is_err());
    }

    #[test]
    #[serial(env)]
    fn test_default_network_must_be_listed() {
        let mut config = EngineConfig::for_network(Network::Mainnet);
        config.networks.insert(Network::Sepolia, network_config());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mainnet"));
    }
}
