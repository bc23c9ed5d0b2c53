use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galang_types::{Amount, CampaignId};

/// What happened to one campaign during a settlement run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Disposition {
    /// Target reached; funds go to the payout path.
    Completed,
    /// Donations converted to credits; campaign ended as a partial
    /// success.
    ConvertedPartial,
    /// Donations converted to credits; campaign ended failed.
    ConvertedFailed,
    /// Inside its grace window; left for a later run.
    GracePending { until: DateTime<Utc> },
    /// Deadline pushed forward by an operator; reopened for donations.
    Extended { new_deadline: DateTime<Utc> },
    /// Rescued from a stale claim; conversion found already applied.
    Recovered,
    /// The unit of work rolled back; the campaign stays claimed for the
    /// staleness re-scan.
    Failed { error: String },
}

/// Per-campaign result row in a batch summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignResult {
    pub campaign_id: CampaignId,
    pub disposition: Disposition,
    pub final_amount: Amount,
    pub credits_issued: Amount,
    pub donations_converted: u64,
    pub donations_skipped: u64,
}

/// Structured outcome of one settlement batch run.
///
/// Always returned, even when some campaigns fail, so operators can see
/// partial progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: u64,
    pub failed: u64,
    pub deferred: u64,
    pub total_amount: Amount,
    pub total_credits: Amount,
    pub results: Vec<CampaignResult>,
}

impl BatchSummary {
    /// Fold one campaign result into the run totals.
    pub fn absorb(&mut self, result: CampaignResult) {
        match &result.disposition {
            Disposition::Failed { .. } => self.failed += 1,
            Disposition::GracePending { .. } | Disposition::Extended { .. } => {
                self.deferred += 1
            }
            _ => {
                self.processed += 1;
                self.total_amount = self.total_amount + result.final_amount;
                self.total_credits = self.total_credits + result.credits_issued;
            }
        }
        self.results.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(disposition: Disposition, amount: i64, credits: i64) -> CampaignResult {
        CampaignResult {
            campaign_id: CampaignId::new(),
            disposition,
            final_amount: Amount::new(amount),
            credits_issued: Amount::new(credits),
            donations_converted: 0,
            donations_skipped: 0,
        }
    }

    #[test]
    fn absorb_tallies_by_disposition() {
        let mut summary = BatchSummary::default();
        summary.absorb(result(Disposition::Completed, 1_000_000, 0));
        summary.absorb(result(Disposition::ConvertedFailed, 200_000, 200_000));
        summary.absorb(result(
            Disposition::Failed {
                error: "store error".into(),
            },
            0,
            0,
        ));
        summary.absorb(result(
            Disposition::GracePending { until: Utc::now() },
            0,
            0,
        ));

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.deferred, 1);
        assert_eq!(summary.total_amount, Amount::new(1_200_000));
        assert_eq!(summary.total_credits, Amount::new(200_000));
        assert_eq!(summary.results.len(), 4);
    }

    #[test]
    fn disposition_serializes_tagged_snake_case() {
        let json = serde_json::to_value(Disposition::ConvertedPartial).unwrap();
        assert_eq!(json["kind"], "converted_partial");

        let json = serde_json::to_value(Disposition::Failed {
            error: "store error".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "failed");
        assert_eq!(json["error"], "store error");
    }
}
