use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galang_types::{Amount, CampaignId, SettlementId};

use crate::error::SettlementError;

/// How a campaign was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureType {
    Completed,
    Partial,
    Failed,
    Cancelled,
}

impl ClosureType {
    /// Returns `true` if this closure obliges refunding donors (through
    /// the out-of-scope payout path or credit conversion).
    pub fn requires_refund(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }
}

/// The permanent record of a campaign reaching a terminal outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub id: SettlementId,
    pub campaign_id: CampaignId,
    pub closure_type: ClosureType,
    /// Total raised at settlement time.
    pub final_amount: Amount,
    /// Amount handed to the payout path (zero for conversions).
    pub disbursement_amount: Amount,
    /// Total wallet credits issued by conversion.
    pub credits_issued: Amount,
    pub donations_converted: u64,
    pub donations_skipped: u64,
    pub reason: String,
    pub settled_at: DateTime<Utc>,
}

/// In-memory book of settlement records, at most one per campaign.
///
/// A second record for the same campaign is refused rather than
/// overwritten — the first record is the authoritative closure.
pub struct RecordBook {
    inner: RwLock<HashMap<CampaignId, SettlementRecord>>,
}

impl RecordBook {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// File a record. Fails if the campaign already has one.
    pub fn file(&self, record: SettlementRecord) -> Result<(), SettlementError> {
        let mut state = self
            .inner
            .write()
            .map_err(|_| SettlementError::Donations("record book lock poisoned".into()))?;
        if state.contains_key(&record.campaign_id) {
            return Err(SettlementError::CampaignAlreadySettled);
        }
        state.insert(record.campaign_id, record);
        Ok(())
    }

    /// The record for a campaign, if settled.
    pub fn get(&self, campaign: &CampaignId) -> Option<SettlementRecord> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.get(campaign).cloned())
    }

    /// Number of filed records.
    pub fn len(&self) -> usize {
        self.inner.read().map(|state| state.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordBook {
    fn default() -> Self {
        Self::new()
    }
}
