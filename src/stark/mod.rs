//! STARK-curve primitives: field encoding, hash chains, key material,
//! provider selection and the ECDSA signer.

pub mod errors;
pub mod field;
pub mod hash;
pub mod keys;
pub mod provider;
pub mod signer;

pub use errors::{SignatureError, SignatureResult};
pub use hash::{HashChain, TypedMessage};
pub use keys::KeyPair;
pub use provider::{select_provider, CurveProvider, StarknetCryptoProvider};
pub use signer::{Signature, SignatureHex, Signer};
