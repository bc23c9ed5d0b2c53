use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galang_types::{Amount, CampaignId, UserId};

use crate::status::{CampaignStatus, ExpiryStatus};

/// How a campaign treats funds raised below its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingType {
    /// All-or-nothing: missing the target converts donations to credits.
    Fixed,
    /// Keep-what-you-raise: missing the target still ends as a partial
    /// success.
    Flexible,
}

/// A fundraising campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub organizer: UserId,
    pub title: String,
    pub target: Amount,
    pub raised: Amount,
    pub deadline: DateTime<Utc>,
    pub funding_type: FundingType,
    /// Optional lower bar that still counts as a partial success for
    /// fixed-funding campaigns.
    pub minimum_goal: Option<Amount>,
    pub status: CampaignStatus,
    pub expiry: ExpiryStatus,
    /// When a settlement run claimed this campaign, if it did.
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// A new active campaign, already past approval.
    pub fn active(
        organizer: UserId,
        title: impl Into<String>,
        target: Amount,
        deadline: DateTime<Utc>,
        funding_type: FundingType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CampaignId::new(),
            organizer,
            title: title.into(),
            target,
            raised: Amount::ZERO,
            deadline,
            funding_type,
            minimum_goal: None,
            status: CampaignStatus::Active,
            expiry: ExpiryStatus::Active,
            claimed_at: None,
            created_at: now,
        }
    }

    /// Funds raised as a fraction of target, in basis points
    /// (10_000 == 100%). Zero target yields 0.
    pub fn success_basis_points(&self) -> u32 {
        self.raised.basis_points_of(self.target)
    }

    /// Returns `true` if the target has been reached or exceeded.
    pub fn target_reached(&self) -> bool {
        !self.target.is_zero() && self.raised >= self.target
    }

    /// Returns `true` if the deadline has passed at `now`.
    pub fn past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    /// Whether missing the target still counts as a partial success:
    /// flexible funding, or a configured minimum goal that was met.
    pub fn qualifies_partial(&self) -> bool {
        match self.funding_type {
            FundingType::Flexible => true,
            FundingType::Fixed => self
                .minimum_goal
                .map(|goal| goal.is_positive() && self.raised >= goal)
                .unwrap_or(false),
        }
    }
}
