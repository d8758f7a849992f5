//! Stark settlement signer - entry point
//!
//! 1. Loads configuration (`CONFIG_PATH`, default `config.yaml`)
//! 2. Loads the STARK key pair from the environment
//! 3. Signs the order described by the `ORDER_*` variables
//! 4. Prints the order payload and, with `WALLET_ADDRESS` set, the
//!    onboarding bundle as JSON on stdout

use std::path::PathBuf;

use anyhow::Context;
use serde_json::json;
use tracing::{error, info};

use stark_settlement::config::{self, constants, EngineConfig};
use stark_settlement::core::{
    init_logging, sanitize, sanitize_secret, OnboardingRequest, SignatureEngine,
};
use stark_settlement::extended::domain::Network;
use stark_settlement::extended::order::{OrderRequest, OrderSide};
use stark_settlement::stark::field::parse_decimal;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn load_engine_config() -> anyhow::Result<EngineConfig> {
    let path = PathBuf::from(env_or("CONFIG_PATH", "config.yaml"));
    if path.exists() {
        info!(path = %path.display(), "Loading configuration");
        Ok(config::load_config(&path)?)
    } else {
        info!(path = %path.display(), "No configuration file, using built-in tables");
        let network: Network = env_or("NETWORK", "sepolia").parse()?;
        Ok(EngineConfig::for_network(network))
    }
}

fn order_from_env(network: Network) -> anyhow::Result<OrderRequest> {
    let side: OrderSide = env_or("ORDER_SIDE", "BUY").parse()?;
    let position_id: u32 = env_or("ORDER_POSITION_ID", "0")
        .parse()
        .context("ORDER_POSITION_ID must be an unsigned integer")?;

    Ok(OrderRequest {
        network,
        market: env_or("ORDER_MARKET", "BTC-USD"),
        side,
        qty: parse_decimal("ORDER_QTY", &env_or("ORDER_QTY", "0.001"))?,
        price: parse_decimal("ORDER_PRICE", &env_or("ORDER_PRICE", "50000"))?,
        position_id,
        fee_rate: None,
        nonce: None,
        expiry_epoch_secs: None,
        order_type: Default::default(),
        time_in_force: Default::default(),
        reduce_only: false,
        post_only: false,
        self_trade_protection: Default::default(),
    })
}

fn run() -> anyhow::Result<()> {
    let config = load_engine_config()?;
    constants::log_configuration();

    let engine = SignatureEngine::from_config(&config)?;

    let private_key =
        std::env::var("STARK_PRIVATE_KEY").context("STARK_PRIVATE_KEY is not set")?;
    let expected_public_key = std::env::var("STARK_PUBLIC_KEY").ok();
    info!(private_key = %sanitize_secret(&private_key), "Loading STARK key pair");
    let key = engine.key_pair(&private_key, expected_public_key.as_deref())?;

    let request = order_from_env(config.network)?;
    let collateral_position = env_or("COLLATERAL_POSITION", &request.position_id.to_string());
    let payload = engine.build_order_payload(&request, &key, &collateral_position)?;

    let mut output = json!({ "order": payload });

    if let Ok(wallet_address) = std::env::var("WALLET_ADDRESS") {
        info!(wallet = %sanitize(&wallet_address), "Building onboarding bundle");
        let onboarding = OnboardingRequest {
            network: config.network,
            wallet_address,
            account_index: env_or("ACCOUNT_INDEX", "0")
                .parse()
                .context("ACCOUNT_INDEX must be an unsigned integer")?,
            tos_accepted: true,
            timestamp: None,
            referral_code: std::env::var("REFERRAL_CODE").ok(),
        };
        output["onboarding"] = serde_json::to_value(engine.onboard(&onboarding, &key)?)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    init_logging();
    info!("Stark settlement signer starting");

    if let Err(e) = run() {
        error!(error = %e, "Signing failed");
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
