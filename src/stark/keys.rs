//! STARK key material
//!
//! A [`KeyPair`] is the only place a private scalar lives. Its `Debug`
//! output never contains the private key, and the public key is always
//! derived through the curve provider rather than trusted from input.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use sha2::{Digest, Sha256};
use starknet_core::types::Felt;

use super::errors::{SignatureError, SignatureResult};
use super::field::{felt_from_biguint, felt_to_hex, normalize_public_key, parse_hex_felt};
use super::provider::CurveProvider;
use super::signer::{is_below_curve_order, EC_ORDER_HEX};

/// Hex digits of the `r` component at the head of a 65-byte Ethereum signature
const ETH_SIGNATURE_R_HEX_LEN: usize = 64;

#[derive(Clone)]
pub struct KeyPair {
    private_key: Felt,
    public_key: Felt,
}

impl KeyPair {
    /// Build a key pair from a hex private scalar, deriving the public key
    pub fn from_private_key_hex(
        private_key: &str,
        provider: &dyn CurveProvider,
    ) -> SignatureResult<Self> {
        let private_key = parse_hex_felt("stark_private_key", private_key)?;
        Self::from_private_key(private_key, provider)
    }

    pub fn from_private_key(
        private_key: Felt,
        provider: &dyn CurveProvider,
    ) -> SignatureResult<Self> {
        if private_key == Felt::ZERO || !is_below_curve_order(&private_key) {
            return Err(SignatureError::invalid(
                "stark_private_key",
                "must be in [1, EC_ORDER)",
            ));
        }
        Ok(Self {
            private_key,
            public_key: provider.public_key(&private_key),
        })
    }

    /// Check the derived public key against a caller-supplied one.
    ///
    /// Formatting differences (prefix, leading zeros) are ignored; a
    /// different key is a `Validation` error.
    pub fn with_expected_public_key(self, expected: &str) -> SignatureResult<Self> {
        let expected = normalize_public_key(expected)?;
        let derived = self.public_key_hex();
        if expected != derived {
            tracing::error!(
                expected = %expected,
                derived = %derived,
                "STARK public key does not match private key"
            );
            return Err(SignatureError::invalid(
                "stark_public_key",
                format!("expected {} but private key derives {}", expected, derived),
            ));
        }
        Ok(self)
    }

    pub fn public_key(&self) -> &Felt {
        &self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        felt_to_hex(&self.public_key)
    }

    pub fn private_key(&self) -> &Felt {
        &self.private_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"REDACTED")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

fn ec_order() -> BigUint {
    let digits = EC_ORDER_HEX.trim_start_matches("0x");
    BigUint::parse_bytes(digits.as_bytes(), 16).unwrap_or_else(BigUint::one)
}

/// `sha256(bytes(seed) || bytes(index))` with both values as minimal
/// big-endian bytes (zero encodes as a single `0x00`)
fn indexed_sha256(seed: &BigUint, index: u64) -> BigUint {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_bytes_be());
    hasher.update(BigUint::from(index).to_bytes_be());
    BigUint::from_bytes_be(&hasher.finalize())
}

/// StarkEx key grinding: rejection-sample SHA-256 outputs until one falls
/// below the largest multiple of `limit` under `2^256`, then reduce.
pub fn grind_key(seed: &BigUint, limit: &BigUint) -> SignatureResult<BigUint> {
    if limit.is_zero() {
        return Err(SignatureError::invalid("limit", "must be non-zero"));
    }
    let two_256 = BigUint::one() << 256usize;
    let max_allowed = &two_256 - (&two_256 % limit);

    let mut index = 0u64;
    loop {
        let key = indexed_sha256(seed, index);
        if key < max_allowed {
            return Ok(key % limit);
        }
        index += 1;
    }
}

/// Derive the STARK private key an exchange account is bound to from the
/// wallet's Ethereum signature over the key-derivation message.
pub fn derive_private_key_from_eth_signature(signature: &str) -> SignatureResult<Felt> {
    let digits = signature
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    let r_hex = digits
        .get(..ETH_SIGNATURE_R_HEX_LEN)
        .filter(|r| r.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| {
            SignatureError::invalid(
                "eth_signature",
                format!("expected at least {} hex digits", ETH_SIGNATURE_R_HEX_LEN),
            )
        })?;

    let r_bytes = hex::decode(r_hex)
        .map_err(|e| SignatureError::invalid("eth_signature", e.to_string()))?;
    let seed = BigUint::from_bytes_be(&r_bytes);
    let key = grind_key(&seed, &ec_order())?;
    felt_from_biguint("eth_signature", &key)
}
