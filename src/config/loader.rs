//! Configuration loader for YAML files

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::AppError;

use super::types::EngineConfig;

/// Load configuration from a YAML file
///
/// This function:
/// 1. Checks if the file exists
/// 2. Parses the YAML content
/// 3. Validates the configuration rules
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use stark_settlement::config::load_config;
///
/// let config = load_config(Path::new("config.yaml"))?;
/// ```
pub fn load_config(path: &Path) -> Result<EngineConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: EngineConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!(
            "YAML parse error in '{}': {}",
            path.display(),
            e
        ))
    })?;

    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<EngineConfig, AppError> {
    let config: EngineConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| AppError::Config(format!("YAML parse error: {}", e)))?;

    config.validate()?;

    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extended::domain::Network;
    use rust_decimal::Decimal;
    use serial_test::serial;
    use std::io::Write;
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    const MINIMAL_CONFIG_YAML: &str = r#"
network: sepolia
providers:
  - starknet-crypto
"#;

    const FULL_CONFIG_YAML: &str = r#"
network: testnet
providers:
  - native-binding
  - starknet-crypto
signing:
  expiry_offset_secs: 86400
  order_ttl_secs: 600
  default_fee_rate: "0.0005"
registry_version: "2024-06"
networks:
  sepolia:
    domain:
      name: Perpetuals
      version: v0
      chain_id: SN_SEPOLIA
      revision: "1"
    onboarding_contract: "0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d"
    assets:
      BTC: "0x4254432d3600000000000000000000"
      USD: "0x31857064564ed0ff978e687456963cba09c2c6985d8f9300a1de4962fafa054"
"#;

    #[test]
    #[serial(env)]
    fn test_load_minimal_config_uses_defaults() {
        let config = load_config_from_str(MINIMAL_CONFIG_YAML).unwrap();
        assert_eq!(config.network, Network::Sepolia);
        assert_eq!(config.signing.expiry_offset_secs, 86_400);
        assert_eq!(config.signing.order_ttl_secs, 3600);
        assert!(config.networks.is_empty());
    }

    #[test]
    #[serial(env)]
    fn test_load_full_config() {
        let config = load_config_from_str(FULL_CONFIG_YAML).unwrap();
        assert_eq!(config.network, Network::Sepolia);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.signing.order_ttl_secs, 600);
        assert_eq!(
            config.signing.default_fee_rate,
            Decimal::from_str("0.0005").unwrap()
        );
        assert_eq!(config.registry_version, "2024-06");
        let sepolia = &config.networks[&Network::Sepolia];
        assert_eq!(sepolia.domain.chain_id, "SN_SEPOLIA");
        assert_eq!(sepolia.assets.len(), 2);
    }

    #[test]
    #[serial(env)]
    fn test_load_config_from_str_invalid_yaml() {
        let result = load_config_from_str("invalid: yaml: content: [");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }

    #[test]
    #[serial(env)]
    fn test_unknown_network_is_a_parse_error() {
        let result = load_config_from_str("network: goerli\n");
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }

    #[test]
    #[serial(env)]
    fn test_load_config_from_str_validation_failure() {
        let yaml = r#"
network: sepolia
providers: []
"#;
        let result = load_config_from_str(yaml);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("providers must name at least one curve provider"));
    }

    #[test]
    #[serial(env)]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Configuration file not found"));
    }

    #[test]
    #[serial(env)]
    fn test_load_config_from_file_valid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG_YAML.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.registry_version, "2024-06");
    }

    #[test]
    #[serial(env)]
    fn test_load_config_from_file_invalid_yaml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid: [yaml: content").unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("YAML parse error"));
    }
}
