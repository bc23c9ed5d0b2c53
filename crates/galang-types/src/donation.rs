use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CampaignId, DonationId, UserId};
use crate::money::Amount;

/// Payment channel through which a donation arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    BankTransfer,
    EWallet,
    Card,
    Qris,
    Other,
}

impl PaymentChannel {
    /// Stable label used in reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::EWallet => "e_wallet",
            Self::Card => "card",
            Self::Qris => "qris",
            Self::Other => "other",
        }
    }
}

/// Processing state of a donation at the payment boundary.
///
/// Only `Completed` donations are visible to settlement and reporting;
/// the payment-gateway mechanics that move a donation through these states
/// live outside this system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Read-only donation record fed in by the payment collaborator.
///
/// `donor` is `None` for anonymous or unresolvable donors; credit
/// conversion skips those and counts them separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: DonationId,
    pub campaign_id: CampaignId,
    pub donor: Option<UserId>,
    pub amount: Amount,
    pub channel: PaymentChannel,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Returns `true` if this donation participates in settlement.
    pub fn is_completed(&self) -> bool {
        self.status == DonationStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentChannel::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
    }

    #[test]
    fn only_completed_donations_settle() {
        let donation = Donation {
            id: DonationId::new(),
            campaign_id: CampaignId::new(),
            donor: Some(UserId::new()),
            amount: Amount::new(50_000),
            channel: PaymentChannel::Qris,
            status: DonationStatus::Pending,
            created_at: Utc::now(),
        };
        assert!(!donation.is_completed());
    }
}
