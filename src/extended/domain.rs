//! Signing domains per exchange deployment
//!
//! The domain separator is hashed into every order message, so each
//! network gets exactly one immutable [`SigningDomain`], loaded once when
//! the engine is built.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use starknet_core::types::Felt;

use crate::stark::errors::{SignatureError, SignatureResult};
use crate::stark::field::{parse_felt, short_string};
use crate::stark::hash::{type_hash_of, TypedMessage, STARKNET_DOMAIN_TYPE};

/// Exchange deployment a signature targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[serde(alias = "testnet")]
    Sepolia,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Sepolia, Network::Mainnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Sepolia => "sepolia",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sepolia" | "testnet" => Ok(Network::Sepolia),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(SignatureError::invalid(
                "network",
                format!("unknown network '{}' (expected sepolia or mainnet)", other),
            )),
        }
    }
}

/// SNIP-12 domain separator `{name, version, chain_id, revision}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDomain {
    pub name: String,
    pub version: String,
    pub chain_id: String,
    pub revision: String,
}

impl SigningDomain {
    /// Perpetuals domain used by the exchange's order settlement contract
    pub fn perpetuals(chain_id: &str) -> Self {
        Self {
            name: "Perpetuals".to_string(),
            version: "v0".to_string(),
            chain_id: chain_id.to_string(),
            revision: "1".to_string(),
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Sepolia => Self::perpetuals("SN_SEPOLIA"),
            Network::Mainnet => Self::perpetuals("SN_MAIN"),
        }
    }

    pub fn validate(&self) -> SignatureResult<()> {
        self.encode_fields().map(|_| ())
    }
}

impl TypedMessage for SigningDomain {
    fn type_hash(&self) -> SignatureResult<Felt> {
        Ok(type_hash_of(STARKNET_DOMAIN_TYPE))
    }

    fn encode_fields(&self) -> SignatureResult<Vec<Felt>> {
        for (field, value) in [
            ("domain.name", &self.name),
            ("domain.version", &self.version),
            ("domain.chain_id", &self.chain_id),
            ("domain.revision", &self.revision),
        ] {
            if value.trim().is_empty() {
                return Err(SignatureError::missing(field));
            }
        }

        // A numeric revision is hashed as its integer value, not as text
        let revision = if self.revision.chars().all(|c| c.is_ascii_digit()) {
            parse_felt("domain.revision", &self.revision)?
        } else {
            short_string("domain.revision", &self.revision)?
        };

        Ok(vec![
            short_string("domain.name", &self.name)?,
            short_string("domain.version", &self.version)?,
            short_string("domain.chain_id", &self.chain_id)?,
            revision,
        ])
    }
}

/// Read-only map from network to its signing domain
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domains: BTreeMap<Network, SigningDomain>,
}

impl DomainRegistry {
    pub fn new(domains: BTreeMap<Network, SigningDomain>) -> SignatureResult<Self> {
        for domain in domains.values() {
            domain.validate()?;
        }
        Ok(Self { domains })
    }

    /// Domains for every known network with the exchange's published values
    pub fn builtin() -> Self {
        Self {
            domains: Network::ALL
                .iter()
                .map(|network| (*network, SigningDomain::for_network(*network)))
                .collect(),
        }
    }

    pub fn get(&self, network: Network) -> SignatureResult<&SigningDomain> {
        self.domains.get(&network).ok_or_else(|| {
            SignatureError::invalid("network", format!("no signing domain for {}", network))
        })
    }
}
