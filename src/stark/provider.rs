//! Curve provider capability
//!
//! The engine never does curve arithmetic itself. It talks to exactly one
//! [`CurveProvider`], chosen once at startup from an ordered preference
//! list. There is no call-time fallback: if the chosen provider fails, the
//! error is surfaced to the caller.

use std::fmt;
use std::sync::{Arc, Mutex};

use starknet_core::types::Felt;
use starknet_crypto::{
    get_public_key, pedersen_hash, poseidon_hash_many, rfc6979_generate_k, sign, verify,
    SignError,
};

use super::errors::{SignatureError, SignatureResult};
use super::signer::Signature;

/// Name of the pure-Rust starknet-crypto provider
pub const STARKNET_CRYPTO: &str = "starknet-crypto";

/// Provider names that do not implement STARK-curve math and must never sign
const REJECTED_PROVIDERS: &[&str] = &["hmac", "sha256", "deterministic-hash", "mock"];

/// STARK-curve primitives consumed by the hashing and signing layers
pub trait CurveProvider: Send + Sync + fmt::Debug {
    /// Stable provider name used in configuration and error messages
    fn name(&self) -> &'static str;

    /// Whether concurrent calls into the provider are safe
    fn is_reentrant(&self) -> bool {
        true
    }

    fn pedersen(&self, left: &Felt, right: &Felt) -> Felt;

    fn poseidon_many(&self, elements: &[Felt]) -> Felt;

    fn public_key(&self, private_key: &Felt) -> Felt;

    /// ECDSA over the STARK curve
    fn sign(
        &self,
        private_key: &Felt,
        message_hash: &Felt,
    ) -> SignatureResult<Signature>;

    fn verify(
        &self,
        public_key: &Felt,
        message_hash: &Felt,
        signature: &Signature,
    ) -> SignatureResult<bool>;
}

/// Pure-Rust provider backed by the `starknet-crypto` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct StarknetCryptoProvider;

impl StarknetCryptoProvider {
    fn signing_fault(reason: impl fmt::Debug) -> SignatureError {
        SignatureError::Signing {
            provider: STARKNET_CRYPTO.to_string(),
            reason: format!("{:?}", reason),
        }
    }
}

impl CurveProvider for StarknetCryptoProvider {
    fn name(&self) -> &'static str {
        STARKNET_CRYPTO
    }

    fn pedersen(&self, left: &Felt, right: &Felt) -> Felt {
        pedersen_hash(left, right)
    }

    fn poseidon_many(&self, elements: &[Felt]) -> Felt {
        poseidon_hash_many(elements)
    }

    fn public_key(&self, private_key: &Felt) -> Felt {
        get_public_key(private_key)
    }

    fn sign(
        &self,
        private_key: &Felt,
        message_hash: &Felt,
    ) -> SignatureResult<Signature> {
        // RFC 6979 nonce; a fresh seed is only drawn when the curve rejects k
        let mut seed: Option<Felt> = None;
        loop {
            let k = rfc6979_generate_k(message_hash, private_key, seed.as_ref());
            match sign(private_key, message_hash, &k) {
                Ok(signature) => {
                    return Ok(Signature {
                        r: signature.r,
                        s: signature.s,
                    })
                }
                Err(SignError::InvalidK) => {
                    seed = Some(match seed {
                        Some(previous) => previous + Felt::ONE,
                        None => Felt::ONE,
                    });
                }
                Err(other) => return Err(Self::signing_fault(other)),
            }
        }
    }

    fn verify(
        &self,
        public_key: &Felt,
        message_hash: &Felt,
        signature: &Signature,
    ) -> SignatureResult<bool> {
        verify(public_key, message_hash, &signature.r, &signature.s)
            .map_err(Self::signing_fault)
    }
}

/// Serializes every call into a provider that is not re-entrant
#[derive(Debug)]
pub struct SerializedProvider {
    name: &'static str,
    inner: Mutex<Box<dyn CurveProvider>>,
}

impl SerializedProvider {
    pub fn new(inner: Box<dyn CurveProvider>) -> Self {
        Self {
            name: inner.name(),
            inner: Mutex::new(inner),
        }
    }

    fn with_inner<T>(&self, f: impl FnOnce(&dyn CurveProvider) -> T) -> T {
        let guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(guard.as_ref())
    }
}

impl CurveProvider for SerializedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn pedersen(&self, left: &Felt, right: &Felt) -> Felt {
        self.with_inner(|p| p.pedersen(left, right))
    }

    fn poseidon_many(&self, elements: &[Felt]) -> Felt {
        self.with_inner(|p| p.poseidon_many(elements))
    }

    fn public_key(&self, private_key: &Felt) -> Felt {
        self.with_inner(|p| p.public_key(private_key))
    }

    fn sign(
        &self,
        private_key: &Felt,
        message_hash: &Felt,
    ) -> SignatureResult<Signature> {
        self.with_inner(|p| p.sign(private_key, message_hash))
    }

    fn verify(
        &self,
        public_key: &Felt,
        message_hash: &Felt,
        signature: &Signature,
    ) -> SignatureResult<bool> {
        self.with_inner(|p| p.verify(public_key, message_hash, signature))
    }
}

fn instantiate(name: &str) -> Option<Box<dyn CurveProvider>> {
    match name {
        STARKNET_CRYPTO => Some(Box::new(StarknetCryptoProvider)),
        _ => None,
    }
}

/// Resolve the first available provider from an ordered preference list.
///
/// Pseudo-signers that do not perform STARK-curve math abort the selection
/// outright instead of being skipped.
pub fn select_provider(preference: &[String]) -> SignatureResult<Arc<dyn CurveProvider>> {
    for raw in preference {
        let name = raw.trim().to_ascii_lowercase();

        if REJECTED_PROVIDERS.contains(&name.as_str()) {
            tracing::error!(provider = %name, "Refusing non-STARK pseudo-signer");
            return Err(SignatureError::ProviderUnavailable(format!(
                "'{}' does not implement STARK-curve signatures",
                name
            )));
        }

        match instantiate(&name) {
            Some(provider) if provider.is_reentrant() => {
                tracing::info!(provider = provider.name(), "Curve provider selected");
                return Ok(Arc::from(provider));
            }
            Some(provider) => {
                tracing::info!(
                    provider = provider.name(),
                    "Curve provider selected (calls serialized)"
                );
                return Ok(Arc::new(SerializedProvider::new(provider)));
            }
            None => {
                tracing::warn!(provider = %name, "Curve provider not available, skipping");
            }
        }
    }

    Err(SignatureError::ProviderUnavailable(format!(
        "none of {:?} could be loaded",
        preference
    )))
}
