use galang_campaign::CampaignError;
use galang_ledger::LedgerError;

/// Errors produced by settlement operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("campaign is already settled or held by another run")]
    CampaignAlreadySettled,

    #[error("unknown settlement action: {0}")]
    InvalidAction(String),

    #[error("campaign not eligible for this action: {0}")]
    NotEligible(String),

    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("donation source error: {0}")]
    Donations(String),
}
