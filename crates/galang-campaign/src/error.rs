use crate::status::{CampaignStatus, ExpiryStatus};

/// Errors produced by campaign state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CampaignError {
    #[error("campaign not found")]
    NotFound,

    #[error("campaign already exists")]
    AlreadyExists,

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: CampaignStatus,
        to: CampaignStatus,
    },

    #[error("campaign is not claimable for settlement (expiry status: {expiry})")]
    NotClaimable { expiry: ExpiryStatus },

    #[error("campaign is not held by a settlement claim (expiry status: {expiry})")]
    NotClaimed { expiry: ExpiryStatus },

    #[error("store error: {0}")]
    StoreError(String),
}
