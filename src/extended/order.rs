//! Order intents and the SNIP-12 order message
//!
//! An [`OrderRequest`] is what a caller asks for (market, side, decimal
//! quantity and price). An [`OrderIntent`] is the exact integer tuple the
//! exchange re-hashes on its side. All sign, scale and range decisions are
//! made while building the intent; hashing never adjusts a value.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use starknet_core::types::Felt;

use super::assets::{AssetId, AssetRegistry};
use super::domain::{Network, SigningDomain};
use crate::stark::errors::{SignatureError, SignatureResult};
use crate::stark::field::{felt_from_i64, parse_hex_felt, to_micro_units};
use crate::stark::hash::{offchain_message_hash, TypedMessage};
use crate::stark::provider::CurveProvider;

/// Poseidon type hash of the `Order` struct under SNIP-12 revision 1:
///
/// ```text
/// "Order"("position_id":"PositionId","base_asset_id":"AssetId","base_amount":"i64",
///   "quote_asset_id":"AssetId","quote_amount":"i64","fee_asset_id":"AssetId",
///   "fee_amount":"u64","expiration":"Timestamp","salt":"felt")
/// "PositionId"("value":"u32")"AssetId"("value":"felt")"Timestamp"("seconds":"u64")
/// ```
pub const ORDER_TYPE_HASH: &str =
    "0x36da8d51815527cabfaa9c982f564c80fa7429616739306036f1f9b608dd112";

/// The exchange hashes `expiration` 24h later than the expiry it shows on
/// the order. Added once, in [`OrderIntent::from_request`].
pub const EXTENDED_EXPIRY_OFFSET_SECONDS: u64 = 86_400;

/// Upper bound (exclusive) of generated salts
const MAX_GENERATED_SALT: u64 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(SignatureError::invalid(
                "side",
                format!("expected BUY or SELL, got '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    #[default]
    Gtt,
    Ioc,
    Fok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SelfTradeProtection {
    Disabled,
    #[default]
    Account,
    Client,
}

/// Caller-facing order parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub network: Network,
    pub market: String,
    pub side: OrderSide,
    pub qty: Decimal,
    pub price: Decimal,
    pub position_id: u32,
    /// Fee rate as a fraction (e.g. `0.0005`); engine default when absent
    #[serde(default)]
    pub fee_rate: Option<Decimal>,
    /// Replay-protection salt; drawn at random when absent
    #[serde(default)]
    pub nonce: Option<u64>,
    /// Expiry in epoch seconds as shown to the user; `now + ttl` when absent
    #[serde(default)]
    pub expiry_epoch_secs: Option<u64>,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub post_only: bool,
    #[serde(default)]
    pub self_trade_protection: SelfTradeProtection,
}

impl OrderRequest {
    /// Fill the optional nonce and expiry so that every artifact built from
    /// this request agrees on them.
    pub fn with_defaults(&self, now_epoch_secs: u64, ttl_secs: u64) -> SignatureResult<Self> {
        let mut filled = self.clone();
        if filled.nonce.is_none() {
            filled.nonce = Some(generate_salt());
        }
        if filled.expiry_epoch_secs.is_none() {
            let expiry = now_epoch_secs
                .checked_add(ttl_secs)
                .ok_or_else(|| SignatureError::invalid("expiry_epoch_secs", "overflows u64"))?;
            filled.expiry_epoch_secs = Some(expiry);
        }
        Ok(filled)
    }
}

/// Random salt in `[1, 2^31)`
pub fn generate_salt() -> u64 {
    rand::thread_rng().gen_range(1..MAX_GENERATED_SALT)
}

/// Signed base/quote amounts and the non-negative fee, in micro-units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAmounts {
    pub base: i64,
    pub quote: i64,
    pub fee: u64,
}

/// Scale, sign and fee an order.
///
/// BUY receives base and pays quote; SELL is the mirror image. The fee is
/// `|quote| * fee_rate` rounded half to even.
pub fn compute_amounts(
    side: OrderSide,
    qty: Decimal,
    price: Decimal,
    fee_rate: Decimal,
) -> SignatureResult<OrderAmounts> {
    if qty <= Decimal::ZERO {
        return Err(SignatureError::invalid("qty", "must be greater than zero"));
    }
    if price <= Decimal::ZERO {
        return Err(SignatureError::invalid("price", "must be greater than zero"));
    }
    if fee_rate.is_sign_negative() && !fee_rate.is_zero() {
        return Err(SignatureError::invalid("fee_rate", "must not be negative"));
    }
    if fee_rate >= Decimal::ONE {
        return Err(SignatureError::invalid("fee_rate", "must be below 1"));
    }

    let base = to_micro_units("qty", qty)?;
    if base == 0 {
        return Err(SignatureError::invalid("qty", "is below one micro-unit"));
    }
    let notional = qty
        .checked_mul(price)
        .ok_or_else(|| SignatureError::invalid("price", "notional overflows"))?;
    let quote = to_micro_units("notional", notional)?;
    if quote == 0 {
        return Err(SignatureError::invalid("price", "notional is below one micro-unit"));
    }

    let fee = Decimal::from(quote)
        .checked_mul(fee_rate)
        .and_then(|fee| {
            fee.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .to_u64()
        })
        .ok_or_else(|| SignatureError::invalid("fee_rate", "fee amount overflows u64"))?;

    let (base, quote) = match side {
        OrderSide::Buy => (base, -quote),
        OrderSide::Sell => (-base, quote),
    };

    Ok(OrderAmounts { base, quote, fee })
}

/// The exact tuple hashed into an order signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub position_id: u32,
    pub base_asset_id: AssetId,
    pub base_amount: i64,
    pub quote_asset_id: AssetId,
    pub quote_amount: i64,
    pub fee_asset_id: AssetId,
    pub fee_amount: u64,
    pub expiration: u64,
    pub salt: u64,
    pub signer_public_key: Felt,
}

impl OrderIntent {
    /// Build the intent for a request whose nonce and expiry are filled in
    /// (see [`OrderRequest::with_defaults`]).
    pub fn from_request(
        request: &OrderRequest,
        assets: &AssetRegistry,
        signer_public_key: Felt,
        default_fee_rate: Decimal,
        expiry_offset_secs: u64,
    ) -> SignatureResult<Self> {
        let market = assets.resolve_market(request.network, &request.market)?;
        let fee_rate = request.fee_rate.unwrap_or(default_fee_rate);
        let amounts = compute_amounts(request.side, request.qty, request.price, fee_rate)?;

        let salt = request.nonce.ok_or_else(|| SignatureError::missing("nonce"))?;
        let expiry = request
            .expiry_epoch_secs
            .ok_or_else(|| SignatureError::missing("expiry_epoch_secs"))?;
        let expiration = expiry
            .checked_add(expiry_offset_secs)
            .ok_or_else(|| SignatureError::invalid("expiry_epoch_secs", "overflows u64"))?;

        Ok(Self {
            position_id: request.position_id,
            base_asset_id: market.base,
            base_amount: amounts.base,
            quote_asset_id: market.quote,
            quote_amount: amounts.quote,
            // Fees are always settled in the collateral (quote) asset
            fee_asset_id: market.quote,
            fee_amount: amounts.fee,
            expiration,
            salt,
            signer_public_key,
        })
    }

    pub fn message_hash(
        &self,
        provider: &dyn CurveProvider,
        domain: &SigningDomain,
    ) -> SignatureResult<Felt> {
        offchain_message_hash(provider, domain, &self.signer_public_key, self)
    }
}

impl TypedMessage for OrderIntent {
    fn type_hash(&self) -> SignatureResult<Felt> {
        parse_hex_felt("order_type_hash", ORDER_TYPE_HASH)
    }

    fn encode_fields(&self) -> SignatureResult<Vec<Felt>> {
        Ok(vec![
            Felt::from(u64::from(self.position_id)),
            self.base_asset_id.felt(),
            felt_from_i64(self.base_amount),
            self.quote_asset_id.felt(),
            felt_from_i64(self.quote_amount),
            self.fee_asset_id.felt(),
            Felt::from(self.fee_amount),
            Felt::from(self.expiration),
            Felt::from(self.salt),
        ])
    }
}
