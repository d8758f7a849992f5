//! Signature engine
//!
//! One immutable value per process: the resolved curve provider plus the
//! domain, asset and contract tables, all injected at construction. Every
//! method is a pure function of its inputs and the engine, so a single
//! engine may be shared behind an `Arc` by any number of threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use starknet_core::types::Felt;

use crate::config::{EngineConfig, SigningConfig};
use crate::core::logging::sanitize_signature;
use crate::error::AppError;
use crate::extended::assets::AssetRegistry;
use crate::extended::domain::{DomainRegistry, Network};
use crate::extended::onboarding::{
    build_complete_onboarding_calls, ContractCall, KeyRegistrationIntent, OnboardingContracts,
    OnboardingIntent,
};
use crate::extended::order::{OrderIntent, OrderRequest};
use crate::extended::settlement::{OrderPayload, SettlementObject};
use crate::stark::errors::{SignatureError, SignatureResult};
use crate::stark::field::felt_to_hex;
use crate::stark::keys::KeyPair;
use crate::stark::provider::{select_provider, CurveProvider};
use crate::stark::signer::{Signature, SignatureHex, Signer};

/// An order signature together with everything it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct SignedOrder {
    /// The request with nonce and expiry filled in
    pub request: OrderRequest,
    pub intent: OrderIntent,
    pub message_hash: Felt,
    pub signature: Signature,
}

/// Inputs of the two-step account onboarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingRequest {
    pub network: Network,
    pub wallet_address: String,
    #[serde(default)]
    pub account_index: u64,
    pub tos_accepted: bool,
    /// Epoch seconds signed into the registration; now when absent
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Signatures and ordered contract calls for one onboarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingBundle {
    pub stark_key: String,
    pub timestamp: u64,
    pub account_signature: SignatureHex,
    pub key_signature: SignatureHex,
    pub calls: Vec<ContractCall>,
}

#[derive(Debug, Clone)]
pub struct SignatureEngine {
    signer: Signer,
    domains: DomainRegistry,
    assets: AssetRegistry,
    contracts: OnboardingContracts,
    signing: SigningConfig,
}

fn now_epoch_secs() -> SignatureResult<u64> {
    u64::try_from(chrono::Utc::now().timestamp())
        .map_err(|_| SignatureError::invalid("clock", "system time is before the epoch"))
}

impl SignatureEngine {
    pub fn new(
        provider: Arc<dyn CurveProvider>,
        domains: DomainRegistry,
        assets: AssetRegistry,
        contracts: OnboardingContracts,
        signing: SigningConfig,
    ) -> Self {
        Self {
            signer: Signer::new(provider),
            domains,
            assets,
            contracts,
            signing,
        }
    }

    /// Resolve the curve provider and load the deployment tables once.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        let provider = select_provider(&config.providers)?;

        let (domains, assets, contracts) = if config.networks.is_empty() {
            (
                DomainRegistry::builtin(),
                AssetRegistry::builtin(),
                OnboardingContracts::builtin()?,
            )
        } else {
            let domains = config
                .networks
                .iter()
                .map(|(network, profile)| (*network, profile.domain.clone()))
                .collect();
            let tables: BTreeMap<Network, BTreeMap<String, String>> = config
                .networks
                .iter()
                .map(|(network, profile)| (*network, profile.assets.clone()))
                .collect();
            let addresses: BTreeMap<Network, String> = config
                .networks
                .iter()
                .map(|(network, profile)| (*network, profile.onboarding_contract.clone()))
                .collect();
            (
                DomainRegistry::new(domains)?,
                AssetRegistry::from_tables(&config.registry_version, &tables)?,
                OnboardingContracts::new(&addresses)?,
            )
        };

        tracing::info!(
            provider = provider.name(),
            registry_version = assets.version(),
            default_network = %config.network,
            "Signature engine ready"
        );

        Ok(Self::new(provider, domains, assets, contracts, config.signing.clone()))
    }

    pub fn provider_name(&self) -> &'static str {
        self.signer.provider_name()
    }

    pub fn signing_config(&self) -> &SigningConfig {
        &self.signing
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// Load a key pair, optionally checking it against the public key the
    /// caller expects.
    #[tracing::instrument(skip(self, private_key))]
    pub fn key_pair(
        &self,
        private_key: &str,
        expected_public_key: Option<&str>,
    ) -> SignatureResult<KeyPair> {
        let pair = KeyPair::from_private_key_hex(private_key, self.signer.provider().as_ref())?;
        match expected_public_key {
            Some(expected) => pair.with_expected_public_key(expected),
            None => Ok(pair),
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fill a request's nonce and expiry from the engine defaults
    pub fn prepare_order(&self, request: &OrderRequest) -> SignatureResult<OrderRequest> {
        request.with_defaults(now_epoch_secs()?, self.signing.order_ttl_secs)
    }

    /// Build the intent for a prepared request (see [`Self::prepare_order`])
    pub fn build_order_intent(
        &self,
        request: &OrderRequest,
        signer_public_key: &Felt,
    ) -> SignatureResult<OrderIntent> {
        OrderIntent::from_request(
            request,
            &self.assets,
            *signer_public_key,
            self.signing.default_fee_rate,
            self.signing.expiry_offset_secs,
        )
    }

    pub fn order_message_hash(
        &self,
        network: Network,
        intent: &OrderIntent,
    ) -> SignatureResult<Felt> {
        let domain = self.domains.get(network)?;
        intent.message_hash(self.signer.provider().as_ref(), domain)
    }

    #[tracing::instrument(
        skip(self, request, key),
        fields(network = %request.network, market = %request.market, side = %request.side)
    )]
    pub fn sign_order(&self, request: &OrderRequest, key: &KeyPair) -> SignatureResult<SignedOrder> {
        let request = self.prepare_order(request)?;
        let intent = self.build_order_intent(&request, key.public_key())?;
        let message_hash = self.order_message_hash(request.network, &intent)?;
        let signature = self.signer.sign(&message_hash, key.private_key())?;

        tracing::debug!(
            position_id = intent.position_id,
            base_amount = intent.base_amount,
            quote_amount = intent.quote_amount,
            fee_amount = intent.fee_amount,
            expiration = intent.expiration,
            salt = intent.salt,
            "Order intent built"
        );
        tracing::info!(
            message_hash = %felt_to_hex(&message_hash),
            signature_r = %sanitize_signature(&felt_to_hex(&signature.r)),
            "Order signed"
        );

        Ok(SignedOrder {
            request,
            intent,
            message_hash,
            signature,
        })
    }

    /// Recompute the order hash from the intent and check the signature
    /// against the intent's signer key.
    pub fn verify_order(
        &self,
        network: Network,
        intent: &OrderIntent,
        signature: &Signature,
    ) -> SignatureResult<bool> {
        let message_hash = self.order_message_hash(network, intent)?;
        self.signer
            .verify(&intent.signer_public_key, &message_hash, signature)
    }

    pub fn create_settlement(
        &self,
        request: &OrderRequest,
        key: &KeyPair,
        collateral_position: &str,
    ) -> SignatureResult<SettlementObject> {
        let signed = self.sign_order(request, key)?;
        self.settlement_for(&signed, key, collateral_position)
    }

    pub fn settlement_for(
        &self,
        signed: &SignedOrder,
        key: &KeyPair,
        collateral_position: &str,
    ) -> SignatureResult<SettlementObject> {
        let settlement =
            SettlementObject::new(&signed.signature, &key.public_key_hex(), collateral_position)?;
        tracing::info!(
            collateral_position = %settlement.collateral_position,
            "Settlement object created"
        );
        Ok(settlement)
    }

    /// Sign an order and wrap it in the exchange's REST body
    pub fn build_order_payload(
        &self,
        request: &OrderRequest,
        key: &KeyPair,
        collateral_position: &str,
    ) -> SignatureResult<OrderPayload> {
        let signed = self.sign_order(request, key)?;
        let settlement = self.settlement_for(&signed, key, collateral_position)?;
        let fee_rate: Decimal = signed
            .request
            .fee_rate
            .unwrap_or(self.signing.default_fee_rate);
        OrderPayload::new(&signed.request, fee_rate, settlement)
    }

    // =========================================================================
    // Onboarding
    // =========================================================================

    fn ensure_own_key(key: &KeyPair, stark_public_key: &Felt) -> SignatureResult<()> {
        if key.public_key() != stark_public_key {
            return Err(SignatureError::invalid(
                "stark_public_key",
                "message names a different key than the signing key pair",
            ));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, intent, key), fields(account_index = intent.account_index))]
    pub fn registration_signature(
        &self,
        intent: &OnboardingIntent,
        key: &KeyPair,
    ) -> SignatureResult<Signature> {
        Self::ensure_own_key(key, &intent.stark_public_key)?;
        let message_hash = intent.message_hash(self.signer.provider().as_ref())?;
        self.signer.sign(&message_hash, key.private_key())
    }

    pub fn key_registration_signature(
        &self,
        intent: &KeyRegistrationIntent,
        key: &KeyPair,
    ) -> SignatureResult<Signature> {
        Self::ensure_own_key(key, &intent.stark_public_key)?;
        let message_hash = intent.message_hash(self.signer.provider().as_ref());
        self.signer.sign(&message_hash, key.private_key())
    }

    /// Sign both registration messages and build the ordered contract calls
    #[tracing::instrument(skip(self, request, key), fields(network = %request.network))]
    pub fn onboard(
        &self,
        request: &OnboardingRequest,
        key: &KeyPair,
    ) -> SignatureResult<OnboardingBundle> {
        if !request.tos_accepted {
            return Err(SignatureError::invalid(
                "tos_accepted",
                "terms of service must be accepted before onboarding",
            ));
        }
        let timestamp = match request.timestamp {
            Some(ts) => ts,
            None => now_epoch_secs()?,
        };
        let intent = OnboardingIntent::register(
            request.account_index,
            &request.wallet_address,
            *key.public_key(),
            timestamp,
        )?;

        let account_signature = self.registration_signature(&intent, key)?;
        let key_signature =
            self.key_registration_signature(&KeyRegistrationIntent::from(&intent), key)?;

        let contract = self.contracts.address(request.network)?;
        let calls = build_complete_onboarding_calls(
            &contract,
            &intent,
            &key_signature,
            request.referral_code.as_deref(),
        )?;

        tracing::info!(
            wallet = %felt_to_hex(&intent.wallet_address),
            calls = calls.len(),
            "Onboarding bundle built"
        );

        Ok(OnboardingBundle {
            stark_key: key.public_key_hex(),
            timestamp,
            account_signature: account_signature.to_hex(),
            key_signature: key_signature.to_hex(),
            calls,
        })
    }

    // =========================================================================
    // Raw hashes
    // =========================================================================

    pub fn sign(&self, message_hash: &Felt, key: &KeyPair) -> SignatureResult<Signature> {
        self.signer.sign(message_hash, key.private_key())
    }

    pub fn verify(
        &self,
        public_key: &Felt,
        message_hash: &Felt,
        signature: &Signature,
    ) -> SignatureResult<bool> {
        self.signer.verify(public_key, message_hash, signature)
    }
}
