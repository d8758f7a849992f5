//! Hash-chain and message-hash assembly
//!
//! Two combinators are supported, both built on the curve provider's
//! primitives:
//!
//! - `Pedersen`: `h(h(...h(h(0, e0), e1)...), n)`, the legacy
//!   `compute_hash_on_elements` chain
//! - `Poseidon`: `poseidon_hash_many(elements)`, used by SNIP-12 revision 1
//!
//! Typed messages are hashed SNIP-12 style: the struct hash is the chain
//! over `[type_hash, fields...]`, and the final message hash binds the
//! domain, the signer's public key and the struct hash together.

use starknet_core::types::Felt;
use starknet_core::utils::{get_selector_from_name, starknet_keccak};

use super::errors::{SignatureError, SignatureResult};
use super::field::short_string;
use super::provider::CurveProvider;

/// Prefix mixed into every off-chain message hash
pub const STARKNET_MESSAGE_PREFIX: &str = "StarkNet Message";

/// SNIP-12 revision 1 type string of the domain separator
pub const STARKNET_DOMAIN_TYPE: &str = "\"StarknetDomain\"(\"name\":\"shortstring\",\"version\":\"shortstring\",\"chainId\":\"shortstring\",\"revision\":\"shortstring\")";

/// Combinator used to reduce an ordered element list to one hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashChain {
    Pedersen,
    Poseidon,
}

impl HashChain {
    pub fn digest(self, provider: &dyn CurveProvider, elements: &[Felt]) -> Felt {
        match self {
            HashChain::Pedersen => {
                let folded = elements
                    .iter()
                    .fold(Felt::ZERO, |acc, element| provider.pedersen(&acc, element));
                provider.pedersen(&folded, &Felt::from(elements.len() as u64))
            }
            HashChain::Poseidon => provider.poseidon_many(elements),
        }
    }
}

/// SNIP-12 type hash: `sn_keccak` of the encoded type string
pub fn type_hash_of(type_string: &str) -> Felt {
    starknet_keccak(type_string.as_bytes())
}

/// Entry-point / action selector derived from a literal name
pub fn selector_from_name(name: &str) -> SignatureResult<Felt> {
    get_selector_from_name(name)
        .map_err(|e| SignatureError::invalid("selector", format!("'{}': {}", name, e)))
}

/// A struct hashed under SNIP-12: a type hash followed by its fields in
/// declaration order.
pub trait TypedMessage {
    fn type_hash(&self) -> SignatureResult<Felt>;

    /// Field elements in the exact order the protocol declares them
    fn encode_fields(&self) -> SignatureResult<Vec<Felt>>;

    fn struct_hash(&self, provider: &dyn CurveProvider) -> SignatureResult<Felt> {
        let mut elements = vec![self.type_hash()?];
        elements.extend(self.encode_fields()?);
        Ok(HashChain::Poseidon.digest(provider, &elements))
    }
}

/// Final off-chain message hash:
/// `H("StarkNet Message", H(domain), public_key, H(message))`
pub fn offchain_message_hash(
    provider: &dyn CurveProvider,
    domain: &dyn TypedMessage,
    public_key: &Felt,
    message: &dyn TypedMessage,
) -> SignatureResult<Felt> {
    let elements = [
        short_string("message_prefix", STARKNET_MESSAGE_PREFIX)?,
        domain.struct_hash(provider)?,
        *public_key,
        message.struct_hash(provider)?,
    ];
    Ok(HashChain::Poseidon.digest(provider, &elements))
}
