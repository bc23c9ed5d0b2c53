//! Campaign lifecycle state machine for the Galang settlement engine.
//!
//! This crate is the single source of truth for "what status should this
//! campaign have". It provides:
//! - [`CampaignStatus`] / [`ExpiryStatus`] with an enforced transition table
//! - [`SettlementPolicy`] — the configurable guard-rule table that
//!   classifies an expired campaign into its settlement outcome
//! - [`CampaignStore`] trait boundary and [`InMemoryCampaignStore`], whose
//!   atomic conditional claim is the lightweight lease that makes batch
//!   settlement idempotent

pub mod campaign;
pub mod error;
pub mod memory;
pub mod policy;
pub mod status;
pub mod store;

pub use campaign::{Campaign, FundingType};
pub use error::CampaignError;
pub use memory::InMemoryCampaignStore;
pub use policy::{Conversion, ConversionBand, Outcome, SettlementPolicy};
pub use status::{CampaignStatus, ExpiryStatus};
pub use store::CampaignStore;
