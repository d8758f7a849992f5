//! Settlement objects and REST order payloads
//!
//! These are the shapes the exchange parses, so field names follow its
//! camelCase JSON exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{OrderRequest, OrderSide, OrderType, SelfTradeProtection, TimeInForce};
use crate::stark::errors::{SignatureError, SignatureResult};
use crate::stark::field::normalize_public_key;
use crate::stark::signer::{Signature, SignatureHex};

/// Signature bundle attached to every order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementObject {
    pub signature: SignatureHex,
    pub stark_key: String,
    pub collateral_position: String,
}

impl SettlementObject {
    pub fn new(
        signature: &Signature,
        stark_public_key: &str,
        collateral_position: &str,
    ) -> SignatureResult<Self> {
        if collateral_position.trim().is_empty() {
            return Err(SignatureError::missing("collateral_position"));
        }
        Ok(Self {
            signature: signature.to_hex(),
            stark_key: normalize_public_key(stark_public_key)?,
            collateral_position: collateral_position.trim().to_string(),
        })
    }
}

/// Order placement body for the exchange's REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub id: String,
    pub market: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
    pub qty: String,
    pub price: String,
    pub time_in_force: TimeInForce,
    /// Expiry as shown to the user, before the hashing offset
    pub expiry_epoch_millis: u64,
    pub fee: String,
    pub nonce: String,
    pub settlement: SettlementObject,
    pub reduce_only: bool,
    pub post_only: bool,
    pub self_trade_protection_level: SelfTradeProtection,
}

impl OrderPayload {
    /// Assemble the payload for a request whose nonce and expiry were
    /// already filled in and signed.
    pub fn new(
        request: &OrderRequest,
        fee_rate: Decimal,
        settlement: SettlementObject,
    ) -> SignatureResult<Self> {
        let nonce = request.nonce.ok_or_else(|| SignatureError::missing("nonce"))?;
        let expiry = request
            .expiry_epoch_secs
            .ok_or_else(|| SignatureError::missing("expiry_epoch_secs"))?;
        let expiry_epoch_millis = expiry
            .checked_mul(1_000)
            .ok_or_else(|| SignatureError::invalid("expiry_epoch_secs", "overflows u64"))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            market: request.market.trim().to_ascii_uppercase(),
            order_type: request.order_type,
            side: request.side,
            qty: request.qty.normalize().to_string(),
            price: request.price.normalize().to_string(),
            time_in_force: request.time_in_force,
            expiry_epoch_millis,
            fee: fee_rate.normalize().to_string(),
            nonce: nonce.to_string(),
            settlement,
            reduce_only: request.reduce_only,
            post_only: request.post_only,
            self_trade_protection_level: request.self_trade_protection,
        })
    }
}
