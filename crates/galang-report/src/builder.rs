use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use galang_ledger::{EntryFilter, EntryKind, LedgerReader};
use galang_types::{Amount, CampaignId, Donation};

use crate::error::ReportError;
use crate::period::ReportPeriod;

/// Donation income inside the window, broken down by payment channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBlock {
    pub by_channel: BTreeMap<String, Amount>,
    pub total: Amount,
}

/// Outflows recorded in the ledger inside the window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseBlock {
    /// Sum of spend entries.
    pub disbursements: Amount,
    /// Sum of refund credit entries.
    pub refunds: Amount,
    pub total: Amount,
}

/// Donation shape statistics for the window.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsBlock {
    pub donation_count: u64,
    /// Donors identified by user id; anonymous donations are counted in
    /// `donation_count` but not here.
    pub distinct_donors: u64,
    /// Mean donation size, rounded toward zero. Zero when there are no
    /// donations.
    pub mean: Amount,
    /// Median donation size; the lower-middle mean for even counts. Zero
    /// when there are no donations.
    pub median: Amount,
}

/// One period's financial report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub period: ReportPeriod,
    pub campaign: Option<CampaignId>,
    pub income: IncomeBlock,
    pub expense: ExpenseBlock,
    pub statistics: StatisticsBlock,
}

/// Deterministic report builders over donations and the ledger.
pub struct ReportBuilder;

impl ReportBuilder {
    /// Build the income/expense/statistics summary for a period.
    ///
    /// Only completed donations inside the window count; an optional
    /// campaign filter narrows both the donation side and the ledger side
    /// to entries referencing that campaign.
    pub fn financial_summary<L: LedgerReader>(
        donations: &[Donation],
        ledger: &L,
        period: ReportPeriod,
        campaign: Option<CampaignId>,
    ) -> Result<FinancialSummary, ReportError> {
        let in_window: Vec<&Donation> = donations
            .iter()
            .filter(|d| d.is_completed())
            .filter(|d| period.contains(d.created_at))
            .filter(|d| campaign.map(|id| d.campaign_id == id).unwrap_or(true))
            .collect();

        let income = Self::income(&in_window);
        let statistics = Self::statistics(&in_window);
        let expense = Self::expense(ledger, period, campaign)?;

        debug!(
            donations = statistics.donation_count,
            income = %income.total,
            expense = %expense.total,
            "financial summary built"
        );

        Ok(FinancialSummary {
            period,
            campaign,
            income,
            expense,
            statistics,
        })
    }

    fn income(donations: &[&Donation]) -> IncomeBlock {
        let mut block = IncomeBlock::default();
        for donation in donations {
            let slot = block
                .by_channel
                .entry(donation.channel.label().to_string())
                .or_insert(Amount::ZERO);
            *slot = *slot + donation.amount;
            block.total = block.total + donation.amount;
        }
        block
    }

    fn statistics(donations: &[&Donation]) -> StatisticsBlock {
        let count = donations.len() as u64;
        if count == 0 {
            return StatisticsBlock::default();
        }

        let distinct: HashSet<_> = donations.iter().filter_map(|d| d.donor).collect();
        let total: Amount = donations.iter().map(|d| d.amount).sum();
        let mean = Amount::new(total.minor_units() / count as i64);

        let mut sizes: Vec<i64> = donations.iter().map(|d| d.amount.minor_units()).collect();
        sizes.sort_unstable();
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 1 {
            Amount::new(sizes[mid])
        } else {
            Amount::new((sizes[mid - 1] + sizes[mid]) / 2)
        };

        StatisticsBlock {
            donation_count: count,
            distinct_donors: distinct.len() as u64,
            mean,
            median,
        }
    }

    fn expense<L: LedgerReader>(
        ledger: &L,
        period: ReportPeriod,
        campaign: Option<CampaignId>,
    ) -> Result<ExpenseBlock, ReportError> {
        let filter = EntryFilter {
            from: Some(period.from),
            to: Some(period.to),
            ..EntryFilter::default()
        };

        let mut block = ExpenseBlock::default();
        for user in ledger.users()? {
            for entry in ledger.entries_filtered(&user, &filter)? {
                if let Some(id) = campaign {
                    if !entry.source.references_campaign(&id) {
                        continue;
                    }
                }
                match entry.kind {
                    EntryKind::Spend => {
                        block.disbursements = block.disbursements + entry.amount;
                    }
                    EntryKind::Refund => {
                        block.refunds = block.refunds + entry.amount;
                    }
                    _ => {}
                }
            }
        }
        block.total = block.disbursements + block.refunds;
        Ok(block)
    }
}
