use chrono::{DateTime, Utc};

use galang_types::CampaignId;

use crate::campaign::Campaign;
use crate::error::CampaignError;
use crate::status::CampaignStatus;

/// Storage boundary for campaigns.
///
/// All implementations must satisfy these invariants:
/// - `set_status` enforces the transition table; a terminal status never
///   regresses.
/// - `claim_for_settlement` is an atomic conditional update: of two
///   concurrent settlement runs, at most one wins the claim. The claim is
///   the lease that serializes settlement per campaign.
/// - Read methods never mutate.
pub trait CampaignStore: Send + Sync {
    /// Fetch a campaign by id.
    fn get(&self, id: &CampaignId) -> Result<Option<Campaign>, CampaignError>;

    /// Insert a new campaign. Fails if the id already exists.
    fn insert(&self, campaign: Campaign) -> Result<(), CampaignError>;

    /// Record newly raised funds against a campaign.
    fn add_raised(
        &self,
        id: &CampaignId,
        amount: galang_types::Amount,
    ) -> Result<Campaign, CampaignError>;

    /// Move a campaign to a new status, enforcing the transition table.
    fn set_status(
        &self,
        id: &CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign, CampaignError>;

    /// Atomically flip expiry `active|expired → processing` and record the
    /// claim instant. Fails with `NotClaimable` if another run holds or
    /// finished the claim.
    fn claim_for_settlement(
        &self,
        id: &CampaignId,
        now: DateTime<Utc>,
    ) -> Result<Campaign, CampaignError>;

    /// Flip expiry `processing → processed` after the unit of work commits.
    fn mark_processed(&self, id: &CampaignId) -> Result<Campaign, CampaignError>;

    /// Push the deadline forward and reset expiry to `active`, reopening
    /// the campaign for donations.
    fn reopen(
        &self,
        id: &CampaignId,
        new_deadline: DateTime<Utc>,
    ) -> Result<Campaign, CampaignError>;

    /// Active campaigns whose deadline has passed and which no run has
    /// claimed or processed yet.
    fn expired_unprocessed(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>, CampaignError>;

    /// Active campaigns whose deadline falls within the next `window_days`.
    fn expiring_within(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<Campaign>, CampaignError>;

    /// Campaigns stuck in `processing` whose claim is older than the
    /// staleness cutoff.
    fn stale_processing(
        &self,
        now: DateTime<Utc>,
        stale_after_hours: i64,
    ) -> Result<Vec<Campaign>, CampaignError>;

    /// Every campaign in the store.
    fn all(&self) -> Result<Vec<Campaign>, CampaignError>;
}
