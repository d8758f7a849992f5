//! StarkEx settlement signing for the Extended perpetuals exchange
//!
//! - STARK-curve primitives behind a swappable provider (`stark`)
//! - Order, onboarding and settlement messages (`extended`)
//! - A shareable signature engine plus structured logging (`core`)

pub mod config;
pub mod core;
pub mod error;
pub mod extended;
pub mod stark;

pub use error::AppError;
