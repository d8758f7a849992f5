//! STARK ECDSA signer
//!
//! Thin wrapper over the selected [`CurveProvider`]. It adds the local
//! sanity check on signature components so a malformed `(r, s)` is never
//! handed back to a caller.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use starknet_core::types::Felt;

use super::errors::{SignatureError, SignatureResult};
use super::field::{felt_to_hex, parse_hex_felt};
use super::provider::CurveProvider;

/// Order of the STARK curve's generator point
pub const EC_ORDER_HEX: &str = "0x800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f";

/// ECDSA signature over the STARK curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: Felt,
    pub s: Felt,
}

/// Wire form of a signature: `0x`-prefixed hex components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHex {
    pub r: String,
    pub s: String,
}

impl Signature {
    pub fn to_hex(&self) -> SignatureHex {
        SignatureHex {
            r: felt_to_hex(&self.r),
            s: felt_to_hex(&self.s),
        }
    }

    /// Parse hex components and run the component sanity check
    pub fn from_hex(r: &str, s: &str) -> SignatureResult<Self> {
        let signature = Signature {
            r: parse_hex_felt("signature.r", r)
                .map_err(|e| SignatureError::VerificationMismatch(e.to_string()))?,
            s: parse_hex_felt("signature.s", s)
                .map_err(|e| SignatureError::VerificationMismatch(e.to_string()))?,
        };
        validate_components(&signature)?;
        Ok(signature)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", felt_to_hex(&self.r), felt_to_hex(&self.s))
    }
}

fn ec_order() -> [u8; 32] {
    // EC_ORDER_HEX is a compile-time literal below the field prime
    Felt::from_hex(EC_ORDER_HEX)
        .map(|order| order.to_bytes_be())
        .unwrap_or([0xff; 32])
}

/// Big-endian byte arrays compare in numeric order
pub(crate) fn is_below_curve_order(value: &Felt) -> bool {
    value.to_bytes_be() < ec_order()
}

fn check_component(name: &str, value: &Felt) -> SignatureResult<()> {
    if *value == Felt::ZERO {
        return Err(SignatureError::VerificationMismatch(format!(
            "signature component {} is zero",
            name
        )));
    }
    if !is_below_curve_order(value) {
        return Err(SignatureError::VerificationMismatch(format!(
            "signature component {} is not below the curve order",
            name
        )));
    }
    Ok(())
}

/// Both components must be in `[1, EC_ORDER)`
pub fn validate_components(signature: &Signature) -> SignatureResult<()> {
    check_component("r", &signature.r)?;
    check_component("s", &signature.s)
}

/// Signing front-end bound to one curve provider
#[derive(Debug, Clone)]
pub struct Signer {
    provider: Arc<dyn CurveProvider>,
}

impl Signer {
    pub fn new(provider: Arc<dyn CurveProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn CurveProvider> {
        &self.provider
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn public_key(&self, private_key: &Felt) -> Felt {
        self.provider.public_key(private_key)
    }

    /// Sign a message hash. Provider faults and malformed components are
    /// returned as errors, never as a partial signature.
    pub fn sign(
        &self,
        message_hash: &Felt,
        private_key: &Felt,
    ) -> SignatureResult<Signature> {
        let signature = self.provider.sign(private_key, message_hash)?;
        validate_components(&signature)?;
        Ok(signature)
    }

    pub fn verify(
        &self,
        public_key: &Felt,
        message_hash: &Felt,
        signature: &Signature,
    ) -> SignatureResult<bool> {
        validate_components(signature)?;
        self.provider.verify(public_key, message_hash, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stark::provider::StarknetCryptoProvider;

    fn signer() -> Signer {
        Signer::new(Arc::new(StarknetCryptoProvider))
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = signer();
        let private_key = Felt::from(0x1234_5678_9abc_def0u64);
        let public_key = signer.public_key(&private_key);
        let message = Felt::from(42u64);

        let signature = signer.sign(&message, &private_key).unwrap();
        assert!(signer.verify(&public_key, &message, &signature).unwrap());
    }

    #[test]
    fn test_repeated_signing_is_byte_identical() {
        let signer = signer();
        let private_key = Felt::from(7u64);
        let message = Felt::from(1_706_836_137u64);

        let a = signer.sign(&message, &private_key).unwrap().to_hex();
        let b = signer.sign(&message, &private_key).unwrap().to_hex();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_component_is_rejected() {
        let sig = Signature {
            r: Felt::ZERO,
            s: Felt::ONE,
        };
        assert!(matches!(
            validate_components(&sig),
            Err(SignatureError::VerificationMismatch(_))
        ));
    }

    #[test]
    fn test_component_at_curve_order_is_rejected() {
        let order = Felt::from_hex(EC_ORDER_HEX).unwrap();
        let sig = Signature {
            r: Felt::ONE,
            s: order,
        };
        assert!(validate_components(&sig).is_err());

        let below = Signature {
            r: Felt::ONE,
            s: order - Felt::ONE,
        };
        assert!(validate_components(&below).is_ok());
    }

    #[test]
    fn test_verify_rejects_malformed_signature_loudly() {
        let signer = signer();
        let sig = Signature {
            r: Felt::ZERO,
            s: Felt::ZERO,
        };
        let result = signer.verify(&Felt::ONE, &Felt::ONE, &sig);
        assert!(matches!(result, Err(SignatureError::VerificationMismatch(_))));
    }

    #[test]
    fn test_from_hex_round_trip_and_rejection() {
        let signer = signer();
        let signature = signer
            .sign(&Felt::from(99u64), &Felt::from(5u64))
            .unwrap();
        let hex = signature.to_hex();
        assert!(hex.r.starts_with("0x"));
        assert_eq!(Signature::from_hex(&hex.r, &hex.s).unwrap(), signature);

        assert!(Signature::from_hex("0xzz", &hex.s).is_err());
        assert!(Signature::from_hex("0x0", &hex.s).is_err());
    }
}
