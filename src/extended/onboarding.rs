//! Account onboarding: registration messages and contract calls
//!
//! Onboarding is two on-chain steps under the same domain. The account
//! registration call must land before the key registration call, so the
//! calls are always produced as one ordered list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use starknet_core::types::Felt;

use super::domain::Network;
use crate::stark::errors::{SignatureError, SignatureResult};
use crate::stark::field::{felt_from_bool, felt_to_hex, parse_hex_felt, short_string};
use crate::stark::hash::{selector_from_name, HashChain};
use crate::stark::provider::CurveProvider;
use crate::stark::signer::Signature;

/// Action tag signed into an account registration
pub const REGISTER_ACTION: &str = "REGISTER";

pub const REGISTER_ACCOUNT_ENTRYPOINT: &str = "register_account";
pub const REGISTER_STARK_KEY_ENTRYPOINT: &str = "register_stark_key";

const SEPOLIA_ONBOARDING_CONTRACT: &str =
    "0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d";

/// Account registration message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingIntent {
    pub account_index: u64,
    pub wallet_address: Felt,
    pub stark_public_key: Felt,
    pub tos_accepted: bool,
    pub timestamp: u64,
    pub action: String,
}

impl OnboardingIntent {
    pub fn register(
        account_index: u64,
        wallet_address: &str,
        stark_public_key: Felt,
        timestamp: u64,
    ) -> SignatureResult<Self> {
        Ok(Self {
            account_index,
            wallet_address: parse_hex_felt("wallet_address", wallet_address)?,
            stark_public_key,
            tos_accepted: true,
            timestamp,
            action: REGISTER_ACTION.to_string(),
        })
    }

    /// `[account_index, wallet, stark_key, tos, timestamp, selector(action)]`
    pub fn elements(&self) -> SignatureResult<Vec<Felt>> {
        if self.action.trim().is_empty() {
            return Err(SignatureError::missing("action"));
        }
        Ok(vec![
            Felt::from(self.account_index),
            self.wallet_address,
            self.stark_public_key,
            felt_from_bool(self.tos_accepted),
            Felt::from(self.timestamp),
            selector_from_name(&self.action)?,
        ])
    }

    pub fn message_hash(&self, provider: &dyn CurveProvider) -> SignatureResult<Felt> {
        Ok(HashChain::Pedersen.digest(provider, &self.elements()?))
    }
}

/// STARK key registration message: a single pairwise hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRegistrationIntent {
    pub wallet_address: Felt,
    pub stark_public_key: Felt,
}

impl KeyRegistrationIntent {
    pub fn message_hash(&self, provider: &dyn CurveProvider) -> Felt {
        provider.pedersen(&self.wallet_address, &self.stark_public_key)
    }
}

impl From<&OnboardingIntent> for KeyRegistrationIntent {
    fn from(intent: &OnboardingIntent) -> Self {
        Self {
            wallet_address: intent.wallet_address,
            stark_public_key: intent.stark_public_key,
        }
    }
}

/// One on-chain invocation; calldata entries are `0x`-prefixed felts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract_address: String,
    pub entrypoint: String,
    pub calldata: Vec<String>,
}

/// Onboarding contract address per network
#[derive(Debug, Clone)]
pub struct OnboardingContracts {
    addresses: BTreeMap<Network, Felt>,
}

impl OnboardingContracts {
    pub fn new(addresses: &BTreeMap<Network, String>) -> SignatureResult<Self> {
        let mut parsed = BTreeMap::new();
        for (network, address) in addresses {
            let field = format!("onboarding_contract.{}", network);
            parsed.insert(*network, parse_hex_felt(&field, address)?);
        }
        Ok(Self { addresses: parsed })
    }

    /// Only Sepolia ships with a known address; mainnet must come from
    /// `networks.mainnet.onboarding_contract`.
    pub fn builtin() -> SignatureResult<Self> {
        Self::new(&BTreeMap::from([(
            Network::Sepolia,
            SEPOLIA_ONBOARDING_CONTRACT.to_string(),
        )]))
    }

    pub fn address(&self, network: Network) -> SignatureResult<String> {
        self.addresses
            .get(&network)
            .map(felt_to_hex)
            .ok_or_else(|| {
                SignatureError::invalid(
                    "onboarding_contract",
                    format!("no onboarding contract configured for {}", network),
                )
            })
    }
}

pub fn build_account_registration_call(
    contract_address: &str,
    intent: &OnboardingIntent,
    referral_code: Option<&str>,
) -> SignatureResult<ContractCall> {
    if intent.action.trim().is_empty() {
        return Err(SignatureError::missing("action"));
    }
    let mut calldata = vec![
        felt_to_hex(&intent.stark_public_key),
        felt_to_hex(&intent.wallet_address),
        felt_to_hex(&felt_from_bool(intent.tos_accepted)),
        felt_to_hex(&Felt::from(intent.timestamp)),
        felt_to_hex(&short_string("action", &intent.action)?),
    ];
    if let Some(code) = referral_code.filter(|code| !code.trim().is_empty()) {
        calldata.push(felt_to_hex(&short_string("referral_code", code.trim())?));
    }

    Ok(ContractCall {
        contract_address: contract_address.to_string(),
        entrypoint: REGISTER_ACCOUNT_ENTRYPOINT.to_string(),
        calldata,
    })
}

pub fn build_key_registration_call(
    contract_address: &str,
    stark_public_key: &Felt,
    signature: &Signature,
) -> ContractCall {
    let hex = signature.to_hex();
    ContractCall {
        contract_address: contract_address.to_string(),
        entrypoint: REGISTER_STARK_KEY_ENTRYPOINT.to_string(),
        calldata: vec![felt_to_hex(stark_public_key), hex.r, hex.s],
    }
}

/// Both onboarding calls, account registration first
pub fn build_complete_onboarding_calls(
    contract_address: &str,
    intent: &OnboardingIntent,
    key_signature: &Signature,
    referral_code: Option<&str>,
) -> SignatureResult<Vec<ContractCall>> {
    Ok(vec![
        build_account_registration_call(contract_address, intent, referral_code)?,
        build_key_registration_call(contract_address, &intent.stark_public_key, key_signature),
    ])
}
