//! Foundation types for the Galang campaign settlement and credit ledger
//! engine.
//!
//! This crate provides the identifier, monetary, and temporal types used
//! throughout the Galang system. Every other Galang crate depends on
//! `galang-types`.
//!
//! # Key Types
//!
//! - [`UserId`], [`CampaignId`], [`DonationId`], [`WalletId`], [`EntryId`],
//!   [`SettlementId`] — time-ordered UUID v7 identifiers
//! - [`Amount`] — monetary value in integer minor units (no floats in money
//!   paths)
//! - [`Clock`] — injectable time source so deadline and expiry logic is
//!   deterministic under test
//! - [`Donation`] — read-only donation record consumed during credit
//!   conversion

pub mod clock;
pub mod donation;
pub mod error;
pub mod ids;
pub mod money;

pub use clock::{Clock, FixedClock, SystemClock};
pub use donation::{Donation, DonationStatus, PaymentChannel};
pub use error::TypeError;
pub use ids::{CampaignId, DonationId, EntryId, SettlementId, UserId, WalletId};
pub use money::Amount;
