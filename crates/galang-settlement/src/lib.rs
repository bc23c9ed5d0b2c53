//! Settlement orchestrator for the Galang engine.
//!
//! Finds campaigns whose deadline has passed, classifies each through the
//! campaign guard-rule table, and drives the campaign store plus the wallet
//! ledger to realize the outcome — completion, partial success, or credit
//! conversion — inside one atomic unit of work per campaign.
//!
//! Idempotence is the central safety property here: the expiry-status claim
//! acts as a lease so no campaign is settled twice, and the ledger's
//! source probe lets the stale-claim rescue path recover from a crash
//! without double-crediting donors.

pub mod action;
pub mod engine;
pub mod error;
pub mod record;
pub mod source;
pub mod summary;

pub use action::SettleAction;
pub use engine::SettlementEngine;
pub use error::SettlementError;
pub use record::{ClosureType, RecordBook, SettlementRecord};
pub use source::{DonationSource, InMemoryDonations};
pub use summary::{BatchSummary, CampaignResult, Disposition};
