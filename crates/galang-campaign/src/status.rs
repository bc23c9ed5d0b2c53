use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary campaign lifecycle status.
///
/// `draft → pending → active → {completed | rejected}`; from `active` a
/// campaign ends in `completed` (target reached, at any time),
/// `ended_partial` or `ended_failed` (deadline passed), and `cancelled` is
/// reachable from any non-terminal state. Terminal statuses never regress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Pending,
    Active,
    Rejected,
    Completed,
    Cancelled,
    EndedFailed,
    EndedPartial,
}

impl CampaignStatus {
    /// Returns `true` if this status never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected
                | Self::Completed
                | Self::Cancelled
                | Self::EndedFailed
                | Self::EndedPartial
        )
    }

    /// Whether the transition table allows moving to `next`.
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            // Cancellation is an explicit organizer/admin escape hatch
            // from any non-terminal state.
            (_, Self::Cancelled) => true,
            (Self::Draft, Self::Pending) => true,
            (Self::Pending, Self::Active) | (Self::Pending, Self::Rejected) => true,
            (
                Self::Active,
                Self::Completed | Self::EndedFailed | Self::EndedPartial,
            ) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::EndedFailed => "ended_failed",
            Self::EndedPartial => "ended_partial",
        };
        write!(f, "{label}")
    }
}

/// Settlement progress, orthogonal to [`CampaignStatus`].
///
/// Exists purely to make settlement idempotent: the orchestrator claims a
/// campaign by flipping `active → processing` before any ledger work and
/// flips to `processed` only after the unit of work commits. A crash
/// between the flips leaves the campaign in `processing`, to be rescued by
/// the staleness re-scan — never silently retried inline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// Not yet claimed; may still be collecting donations.
    Active,
    /// Descriptive label: deadline passed, not yet claimed.
    Expired,
    /// Claimed by a settlement run; the lease is held.
    Processing,
    /// Settlement committed; never re-processed.
    Processed,
}

impl ExpiryStatus {
    /// Returns `true` if a settlement run may claim this campaign.
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Active | Self::Expired)
    }
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Processing => "processing",
            Self::Processed => "processed",
        };
        write!(f, "{label}")
    }
}
