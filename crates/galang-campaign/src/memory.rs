use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use galang_types::{Amount, CampaignId};

use crate::campaign::Campaign;
use crate::error::CampaignError;
use crate::status::{CampaignStatus, ExpiryStatus};
use crate::store::CampaignStore;

/// In-memory campaign store for tests, local demos, and embedding.
///
/// The write lock makes `claim_for_settlement` an atomic conditional
/// update: the expiry check and the flip to `processing` happen under one
/// guard, so two concurrent runs cannot both win the same campaign.
pub struct InMemoryCampaignStore {
    inner: RwLock<HashMap<CampaignId, Campaign>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn write_state(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<CampaignId, Campaign>>, CampaignError>
    {
        self.inner
            .write()
            .map_err(|_| CampaignError::StoreError("campaign write lock poisoned".into()))
    }

    fn read_state(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<CampaignId, Campaign>>, CampaignError>
    {
        self.inner
            .read()
            .map_err(|_| CampaignError::StoreError("campaign read lock poisoned".into()))
    }
}

impl Default for InMemoryCampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignStore for InMemoryCampaignStore {
    fn get(&self, id: &CampaignId) -> Result<Option<Campaign>, CampaignError> {
        Ok(self.read_state()?.get(id).cloned())
    }

    fn insert(&self, campaign: Campaign) -> Result<(), CampaignError> {
        let mut state = self.write_state()?;
        if state.contains_key(&campaign.id) {
            return Err(CampaignError::AlreadyExists);
        }
        state.insert(campaign.id, campaign);
        Ok(())
    }

    fn add_raised(&self, id: &CampaignId, amount: Amount) -> Result<Campaign, CampaignError> {
        let mut state = self.write_state()?;
        let campaign = state.get_mut(id).ok_or(CampaignError::NotFound)?;
        campaign.raised = campaign
            .raised
            .checked_add(amount)
            .map_err(|e| CampaignError::StoreError(e.to_string()))?;
        Ok(campaign.clone())
    }

    fn set_status(
        &self,
        id: &CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign, CampaignError> {
        let mut state = self.write_state()?;
        let campaign = state.get_mut(id).ok_or(CampaignError::NotFound)?;
        if !campaign.status.can_transition_to(status) {
            return Err(CampaignError::InvalidTransition {
                from: campaign.status,
                to: status,
            });
        }
        campaign.status = status;
        Ok(campaign.clone())
    }

    fn claim_for_settlement(
        &self,
        id: &CampaignId,
        now: DateTime<Utc>,
    ) -> Result<Campaign, CampaignError> {
        let mut state = self.write_state()?;
        let campaign = state.get_mut(id).ok_or(CampaignError::NotFound)?;
        if !campaign.expiry.is_claimable() {
            return Err(CampaignError::NotClaimable {
                expiry: campaign.expiry,
            });
        }
        campaign.expiry = ExpiryStatus::Processing;
        campaign.claimed_at = Some(now);
        Ok(campaign.clone())
    }

    fn mark_processed(&self, id: &CampaignId) -> Result<Campaign, CampaignError> {
        let mut state = self.write_state()?;
        let campaign = state.get_mut(id).ok_or(CampaignError::NotFound)?;
        if campaign.expiry != ExpiryStatus::Processing {
            return Err(CampaignError::NotClaimed {
                expiry: campaign.expiry,
            });
        }
        campaign.expiry = ExpiryStatus::Processed;
        Ok(campaign.clone())
    }

    fn reopen(
        &self,
        id: &CampaignId,
        new_deadline: DateTime<Utc>,
    ) -> Result<Campaign, CampaignError> {
        let mut state = self.write_state()?;
        let campaign = state.get_mut(id).ok_or(CampaignError::NotFound)?;
        if campaign.status.is_terminal() {
            return Err(CampaignError::InvalidTransition {
                from: campaign.status,
                to: CampaignStatus::Active,
            });
        }
        campaign.deadline = new_deadline;
        campaign.expiry = ExpiryStatus::Active;
        campaign.claimed_at = None;
        Ok(campaign.clone())
    }

    fn expired_unprocessed(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>, CampaignError> {
        let state = self.read_state()?;
        let mut found: Vec<Campaign> = state
            .values()
            .filter(|c| {
                c.status == CampaignStatus::Active
                    && c.past_deadline(now)
                    && c.expiry.is_claimable()
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.deadline);
        Ok(found)
    }

    fn expiring_within(
        &self,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> Result<Vec<Campaign>, CampaignError> {
        let cutoff = now + Duration::days(window_days);
        let state = self.read_state()?;
        let mut found: Vec<Campaign> = state
            .values()
            .filter(|c| {
                c.status == CampaignStatus::Active
                    && c.expiry.is_claimable()
                    && c.deadline > now
                    && c.deadline <= cutoff
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.deadline);
        Ok(found)
    }

    fn stale_processing(
        &self,
        now: DateTime<Utc>,
        stale_after_hours: i64,
    ) -> Result<Vec<Campaign>, CampaignError> {
        let state = self.read_state()?;
        let mut found: Vec<Campaign> = state
            .values()
            .filter(|c| {
                c.expiry == ExpiryStatus::Processing
                    && c.claimed_at
                        .map(|claimed| now >= claimed + Duration::hours(stale_after_hours))
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        found.sort_by_key(|c| c.claimed_at);
        Ok(found)
    }

    fn all(&self) -> Result<Vec<Campaign>, CampaignError> {
        let state = self.read_state()?;
        let mut found: Vec<Campaign> = state.values().cloned().collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use galang_types::UserId;

    use crate::campaign::FundingType;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
    }

    fn expired_campaign() -> Campaign {
        Campaign::active(
            UserId::new(),
            "school books",
            Amount::new(1_000_000),
            now() - Duration::days(1),
            FundingType::Fixed,
            now() - Duration::days(31),
        )
    }

    #[test]
    fn claim_is_exclusive() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();

        let claimed = store.claim_for_settlement(&id, now()).unwrap();
        assert_eq!(claimed.expiry, ExpiryStatus::Processing);
        assert_eq!(claimed.claimed_at, Some(now()));

        // A second run must lose the race.
        let error = store.claim_for_settlement(&id, now()).unwrap_err();
        assert_eq!(
            error,
            CampaignError::NotClaimable {
                expiry: ExpiryStatus::Processing
            }
        );
    }

    #[test]
    fn processed_campaigns_cannot_be_reclaimed() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();

        store.claim_for_settlement(&id, now()).unwrap();
        store.mark_processed(&id).unwrap();

        let error = store.claim_for_settlement(&id, now()).unwrap_err();
        assert_eq!(
            error,
            CampaignError::NotClaimable {
                expiry: ExpiryStatus::Processed
            }
        );
    }

    #[test]
    fn mark_processed_requires_claim() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();

        let error = store.mark_processed(&id).unwrap_err();
        assert_eq!(
            error,
            CampaignError::NotClaimed {
                expiry: ExpiryStatus::Active
            }
        );
    }

    #[test]
    fn set_status_enforces_transition_table() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();

        store.set_status(&id, CampaignStatus::Completed).unwrap();

        let error = store.set_status(&id, CampaignStatus::Active).unwrap_err();
        assert_eq!(
            error,
            CampaignError::InvalidTransition {
                from: CampaignStatus::Completed,
                to: CampaignStatus::Active,
            }
        );
    }

    #[test]
    fn expired_unprocessed_selects_only_eligible() {
        let store = InMemoryCampaignStore::new();

        let expired = expired_campaign();
        let expired_id = expired.id;
        store.insert(expired).unwrap();

        let mut still_running = expired_campaign();
        still_running.deadline = now() + Duration::days(10);
        store.insert(still_running).unwrap();

        let mut already_claimed = expired_campaign();
        already_claimed.expiry = ExpiryStatus::Processing;
        store.insert(already_claimed).unwrap();

        let eligible = store.expired_unprocessed(now()).unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, expired_id);
    }

    #[test]
    fn expiring_within_window() {
        let store = InMemoryCampaignStore::new();

        let mut soon = expired_campaign();
        soon.deadline = now() + Duration::days(3);
        let soon_id = soon.id;
        store.insert(soon).unwrap();

        let mut later = expired_campaign();
        later.deadline = now() + Duration::days(30);
        store.insert(later).unwrap();

        let upcoming = store.expiring_within(now(), 7).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, soon_id);
    }

    #[test]
    fn stale_processing_respects_timeout() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();
        store.claim_for_settlement(&id, now()).unwrap();

        assert!(store
            .stale_processing(now() + Duration::hours(1), 6)
            .unwrap()
            .is_empty());

        let stale = store
            .stale_processing(now() + Duration::hours(7), 6)
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, id);
    }

    #[test]
    fn reopen_resets_expiry_and_deadline() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();
        store.claim_for_settlement(&id, now()).unwrap();

        let new_deadline = now() + Duration::days(14);
        let reopened = store.reopen(&id, new_deadline).unwrap();
        assert_eq!(reopened.expiry, ExpiryStatus::Active);
        assert_eq!(reopened.deadline, new_deadline);
        assert_eq!(reopened.claimed_at, None);
    }

    #[test]
    fn reopen_refuses_terminal_campaigns() {
        let store = InMemoryCampaignStore::new();
        let campaign = expired_campaign();
        let id = campaign.id;
        store.insert(campaign).unwrap();
        store.set_status(&id, CampaignStatus::Cancelled).unwrap();

        let error = store.reopen(&id, now() + Duration::days(7)).unwrap_err();
        assert!(matches!(error, CampaignError::InvalidTransition { .. }));
    }
}
