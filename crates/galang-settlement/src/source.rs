use std::collections::HashMap;
use std::sync::RwLock;

use galang_types::{CampaignId, Donation};

use crate::error::SettlementError;

/// Read-only boundary to the donation records collected by the payment
/// collaborator.
pub trait DonationSource: Send + Sync {
    /// Completed donations for a campaign, in creation order.
    fn completed_for(&self, campaign: &CampaignId) -> Result<Vec<Donation>, SettlementError>;
}

/// In-memory donation source for tests, local demos, and embedding.
pub struct InMemoryDonations {
    inner: RwLock<HashMap<CampaignId, Vec<Donation>>>,
}

impl InMemoryDonations {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Record a donation.
    pub fn add(&self, donation: Donation) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        state.entry(donation.campaign_id).or_default().push(donation);
    }
}

impl Default for InMemoryDonations {
    fn default() -> Self {
        Self::new()
    }
}

impl DonationSource for InMemoryDonations {
    fn completed_for(&self, campaign: &CampaignId) -> Result<Vec<Donation>, SettlementError> {
        let state = self
            .inner
            .read()
            .map_err(|_| SettlementError::Donations("donation lock poisoned".into()))?;
        Ok(state
            .get(campaign)
            .map(|donations| {
                donations
                    .iter()
                    .filter(|d| d.is_completed())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
