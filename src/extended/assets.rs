//! Versioned asset-id registry
//!
//! Asset ids must track the exchange's on-chain registry exactly: a stale
//! id still produces a well-formed signature, just one the exchange will
//! reject. Every id therefore lives in one table per network, tagged with
//! the version it was copied from.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use starknet_core::types::Felt;

use super::domain::Network;
use crate::stark::errors::{SignatureError, SignatureResult};
use crate::stark::field::{felt_to_hex, parse_hex_felt};

/// Registry snapshot the built-in table was taken from
pub const BUILTIN_REGISTRY_VERSION: &str = "2024-02-perpetuals";

const BTC_ASSET_ID: &str = "0x4254432d3600000000000000000000";
const ETH_ASSET_ID: &str = "0x4554482d3600000000000000000000";
const USD_COLLATERAL_ASSET_ID: &str =
    "0x31857064564ed0ff978e687456963cba09c2c6985d8f9300a1de4962fafa054";

/// Quote symbol assumed when a market name has no `-QUOTE` part
pub const DEFAULT_QUOTE_SYMBOL: &str = "USD";

const BUILTIN_ASSETS: &[(&str, &str)] = &[
    ("BTC", BTC_ASSET_ID),
    ("ETH", ETH_ASSET_ID),
    ("USD", USD_COLLATERAL_ASSET_ID),
    ("USDT", USD_COLLATERAL_ASSET_ID),
];

/// On-chain identifier of a traded or collateral asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct AssetId(Felt);

impl AssetId {
    pub fn from_hex(value: &str) -> SignatureResult<Self> {
        parse_hex_felt("asset_id", value).map(AssetId)
    }

    pub fn felt(&self) -> Felt {
        self.0
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        felt_to_hex(&id.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", felt_to_hex(&self.0))
    }
}

/// Base and quote asset ids of one market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketAssets {
    pub base: AssetId,
    pub quote: AssetId,
}

#[derive(Debug, Clone)]
pub struct AssetRegistry {
    version: String,
    assets: BTreeMap<Network, BTreeMap<String, AssetId>>,
}

impl AssetRegistry {
    pub fn builtin() -> Self {
        let table: BTreeMap<String, AssetId> = BUILTIN_ASSETS
            .iter()
            .filter_map(|(symbol, id)| AssetId::from_hex(id).ok().map(|id| (symbol.to_string(), id)))
            .collect();

        Self {
            version: BUILTIN_REGISTRY_VERSION.to_string(),
            assets: Network::ALL.iter().map(|n| (*n, table.clone())).collect(),
        }
    }

    /// Build a registry from `network -> symbol -> hex id` tables
    pub fn from_tables(
        version: &str,
        tables: &BTreeMap<Network, BTreeMap<String, String>>,
    ) -> SignatureResult<Self> {
        if version.trim().is_empty() {
            return Err(SignatureError::missing("registry_version"));
        }

        let mut assets = BTreeMap::new();
        for (network, table) in tables {
            let mut entries = BTreeMap::new();
            for (symbol, id) in table {
                let id = parse_hex_felt(&format!("assets.{}.{}", network, symbol), id)?;
                entries.insert(symbol.trim().to_ascii_uppercase(), AssetId(id));
            }
            assets.insert(*network, entries);
        }

        Ok(Self {
            version: version.to_string(),
            assets,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn lookup(&self, network: Network, symbol: &str) -> SignatureResult<AssetId> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.assets
            .get(&network)
            .and_then(|table| table.get(&symbol))
            .copied()
            .ok_or_else(|| {
                SignatureError::invalid(
                    "asset",
                    format!(
                        "unknown symbol '{}' on {} (registry {})",
                        symbol, network, self.version
                    ),
                )
            })
    }

    /// Resolve `BASE-QUOTE` (or a bare `BASE`, quoted in USD) to asset ids
    pub fn resolve_market(&self, network: Network, market: &str) -> SignatureResult<MarketAssets> {
        let market = market.trim();
        if market.is_empty() {
            return Err(SignatureError::missing("market"));
        }

        let (base, quote) = match market.split_once('-') {
            Some((base, quote)) => (base, quote),
            None => (market, DEFAULT_QUOTE_SYMBOL),
        };
        if base.is_empty() || quote.is_empty() || quote.contains('-') {
            return Err(SignatureError::invalid(
                "market",
                format!("'{}' is not of the form BASE-QUOTE", market),
            ));
        }

        Ok(MarketAssets {
            base: self.lookup(network, base)?,
            quote: self.lookup(network, quote)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_btc_usd() {
        let registry = AssetRegistry::builtin();
        let market = registry.resolve_market(Network::Sepolia, "BTC-USD").unwrap();
        assert_eq!(market.base.to_string(), BTC_ASSET_ID);
        assert_eq!(market.quote.to_string(), USD_COLLATERAL_ASSET_ID);
    }

    #[test]
    fn test_bare_symbol_defaults_to_usd_quote() {
        let registry = AssetRegistry::builtin();
        let bare = registry.resolve_market(Network::Mainnet, "eth").unwrap();
        let full = registry.resolve_market(Network::Mainnet, "ETH-USD").unwrap();
        assert_eq!(bare, full);
    }

    #[test]
    fn test_usdt_and_usd_share_collateral_id() {
        let registry = AssetRegistry::builtin();
        assert_eq!(
            registry.lookup(Network::Sepolia, "USDT").unwrap(),
            registry.lookup(Network::Sepolia, "USD").unwrap()
        );
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let registry = AssetRegistry::builtin();
        let err = registry.resolve_market(Network::Sepolia, "DOGE-USD").unwrap_err();
        assert!(matches!(err, SignatureError::Validation(_)));
        assert!(err.to_string().contains("DOGE"));
    }

    #[test]
    fn test_malformed_market_names() {
        let registry = AssetRegistry::builtin();
        assert!(registry.resolve_market(Network::Sepolia, "").is_err());
        assert!(registry.resolve_market(Network::Sepolia, "BTC-").is_err());
        assert!(registry.resolve_market(Network::Sepolia, "BTC-USD-PERP").is_err());
    }

    #[test]
    fn test_from_tables_normalizes_symbols_and_checks_ids() {
        let tables = BTreeMap::from([(
            Network::Sepolia,
            BTreeMap::from([("sol".to_string(), "0x534f4c2d33".to_string())]),
        )]);
        let registry = AssetRegistry::from_tables("v7", &tables).unwrap();
        assert_eq!(registry.version(), "v7");
        assert!(registry.lookup(Network::Sepolia, "SOL").is_ok());
        assert!(registry.lookup(Network::Mainnet, "SOL").is_err());

        let bad = BTreeMap::from([(
            Network::Sepolia,
            BTreeMap::from([("SOL".to_string(), "0xnothex".to_string())]),
        )]);
        assert!(AssetRegistry::from_tables("v7", &bad).is_err());
        assert!(AssetRegistry::from_tables(" ", &tables).is_err());
    }

    #[test]
    fn test_asset_id_serializes_as_hex() {
        let id = AssetId::from_hex(BTC_ASSET_ID).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", BTC_ASSET_ID));
    }
}
