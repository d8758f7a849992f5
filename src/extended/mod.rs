//! Exchange-specific message shapes: signing domains, asset ids, order and
//! onboarding intents, and the settlement artifacts handed back to callers.

pub mod assets;
pub mod domain;
pub mod onboarding;
pub mod order;
pub mod settlement;

pub use assets::{AssetId, AssetRegistry, MarketAssets};
pub use domain::{DomainRegistry, Network, SigningDomain};
pub use onboarding::{
    build_complete_onboarding_calls, ContractCall, KeyRegistrationIntent, OnboardingContracts,
    OnboardingIntent,
};
pub use order::{OrderIntent, OrderRequest, OrderSide, EXTENDED_EXPIRY_OFFSET_SECONDS};
pub use settlement::{OrderPayload, SettlementObject};
