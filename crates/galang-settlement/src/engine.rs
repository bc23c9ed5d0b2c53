use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};

use galang_campaign::{
    Campaign, CampaignError, CampaignStatus, CampaignStore, Conversion, Outcome, SettlementPolicy,
};
use galang_ledger::{
    CreditInstruction, EntryKind, EntrySource, LedgerReader, LedgerWriter, Metadata,
};
use galang_types::{Amount, CampaignId, Clock, SettlementId};

use crate::action::SettleAction;
use crate::error::SettlementError;
use crate::record::{ClosureType, RecordBook, SettlementRecord};
use crate::source::DonationSource;
use crate::summary::{BatchSummary, CampaignResult, Disposition};

/// Batch-reconciles expired campaigns into terminal outcomes.
///
/// Each campaign is one unit of work: claim the expiry lease, realize the
/// classified outcome against the ledger and the campaign store, file the
/// settlement record, release the lease as `processed`. A failure rolls
/// back only that campaign — the lease stays held so the staleness rescue
/// picks it up — and the batch moves on.
pub struct SettlementEngine<C, L, D, K> {
    campaigns: C,
    ledger: L,
    donations: D,
    clock: K,
    policy: SettlementPolicy,
    records: RecordBook,
}

impl<C, L, D, K> SettlementEngine<C, L, D, K>
where
    C: CampaignStore,
    L: LedgerReader + LedgerWriter,
    D: DonationSource,
    K: Clock,
{
    pub fn new(campaigns: C, ledger: L, donations: D, clock: K, policy: SettlementPolicy) -> Self {
        Self {
            campaigns,
            ledger,
            donations,
            clock,
            policy,
            records: RecordBook::new(),
        }
    }

    pub fn campaigns(&self) -> &C {
        &self.campaigns
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn records(&self) -> &RecordBook {
        &self.records
    }

    pub fn policy(&self) -> &SettlementPolicy {
        &self.policy
    }

    /// Reconcile every expired, unprocessed campaign. Campaigns are
    /// handled sequentially; a per-campaign failure is tallied and logged,
    /// never aborts the run.
    pub fn run_batch(&self) -> Result<BatchSummary, SettlementError> {
        let now = self.clock.now();
        let due = self.campaigns.expired_unprocessed(now)?;
        info!(candidates = due.len(), "settlement batch starting");

        let mut summary = BatchSummary::default();
        for campaign in due {
            match self.settle_due(&campaign, now) {
                Ok(Some(result)) => summary.absorb(result),
                // Another run won the claim between scan and flip.
                Ok(None) => debug!(campaign = %campaign.id, "claim lost, skipping"),
                Err(e) => {
                    error!(campaign = %campaign.id, error = %e, "campaign settlement failed");
                    summary.absorb(CampaignResult {
                        campaign_id: campaign.id,
                        disposition: Disposition::Failed {
                            error: e.to_string(),
                        },
                        final_amount: campaign.raised,
                        credits_issued: Amount::ZERO,
                        donations_converted: 0,
                        donations_skipped: 0,
                    });
                }
            }
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            deferred = summary.deferred,
            total_credits = %summary.total_credits,
            "settlement batch finished"
        );
        Ok(summary)
    }

    /// Operator-triggered action on a single campaign.
    pub fn settle_campaign(
        &self,
        id: &CampaignId,
        action: SettleAction,
    ) -> Result<CampaignResult, SettlementError> {
        let now = self.clock.now();
        let campaign = self
            .campaigns
            .get(id)?
            .ok_or(SettlementError::Campaign(CampaignError::NotFound))?;

        match action {
            SettleAction::Credits => match self.policy.classify(&campaign, now) {
                Outcome::Completed => self.complete_campaign(&campaign, now, "target reached"),
                // Operator conversion skips the grace window on purpose.
                Outcome::Convert(conversion) => self.convert_campaign(&campaign, conversion, now),
                Outcome::StillActive => Err(SettlementError::NotEligible(
                    "deadline has not passed and target is not reached".into(),
                )),
            }
            .map_err(claim_conflict_to_already_settled),

            SettleAction::Extend { days } => {
                if !campaign.expiry.is_claimable()
                    && campaign.expiry != galang_campaign::ExpiryStatus::Processing
                {
                    return Err(SettlementError::CampaignAlreadySettled);
                }
                let new_deadline = now + Duration::days(days);
                let reopened = self.campaigns.reopen(id, new_deadline)?;
                info!(campaign = %id, deadline = %new_deadline, "campaign deadline extended");
                Ok(CampaignResult {
                    campaign_id: *id,
                    disposition: Disposition::Extended { new_deadline },
                    final_amount: reopened.raised,
                    credits_issued: Amount::ZERO,
                    donations_converted: 0,
                    donations_skipped: 0,
                })
            }

            SettleAction::Complete => {
                if !campaign.status.can_transition_to(CampaignStatus::Completed) {
                    return Err(SettlementError::NotEligible(format!(
                        "status {} cannot complete",
                        campaign.status
                    )));
                }
                warn!(
                    campaign = %id,
                    raised = %campaign.raised,
                    target = %campaign.target,
                    "manual completion override"
                );
                self.complete_campaign(&campaign, now, "manual completion override")
                    .map_err(claim_conflict_to_already_settled)
            }
        }
    }

    /// Active campaigns whose deadline falls within the window. Dry run;
    /// mutates nothing.
    pub fn preview_expiring(&self, window_days: i64) -> Result<Vec<Campaign>, SettlementError> {
        let now = self.clock.now();
        Ok(self.campaigns.expiring_within(now, window_days)?)
    }

    /// Rescue campaigns stuck in `processing` past the staleness cutoff —
    /// the recovery path for a crash between the ledger commit and the
    /// `processed` flip. The ledger's source probe guarantees donors are
    /// never credited twice.
    pub fn recover_stale(&self) -> Result<BatchSummary, SettlementError> {
        let now = self.clock.now();
        let stale = self
            .campaigns
            .stale_processing(now, self.policy.stale_claim_hours)?;

        let mut summary = BatchSummary::default();
        for campaign in stale {
            warn!(campaign = %campaign.id, claimed_at = ?campaign.claimed_at, "rescuing stale settlement claim");
            match self.finish_claimed(&campaign, now) {
                Ok(result) => summary.absorb(result),
                Err(e) => {
                    error!(campaign = %campaign.id, error = %e, "stale claim rescue failed");
                    summary.absorb(CampaignResult {
                        campaign_id: campaign.id,
                        disposition: Disposition::Failed {
                            error: e.to_string(),
                        },
                        final_amount: campaign.raised,
                        credits_issued: Amount::ZERO,
                        donations_converted: 0,
                        donations_skipped: 0,
                    });
                }
            }
        }
        Ok(summary)
    }

    /// Settle one freshly scanned campaign. Returns `Ok(None)` when the
    /// claim was lost to a concurrent run.
    fn settle_due(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> Result<Option<CampaignResult>, SettlementError> {
        match self.policy.classify(campaign, now) {
            // Deadline moved between scan and classification.
            Outcome::StillActive => Ok(None),
            Outcome::Completed => {
                match self.complete_campaign(campaign, now, "target reached") {
                    Ok(result) => Ok(Some(result)),
                    Err(SettlementError::Campaign(CampaignError::NotClaimable { .. })) => Ok(None),
                    Err(e) => Err(e),
                }
            }
            Outcome::Convert(conversion) => {
                let until = self.policy.convert_after(campaign, conversion.band);
                if now < until {
                    return Ok(Some(CampaignResult {
                        campaign_id: campaign.id,
                        disposition: Disposition::GracePending { until },
                        final_amount: campaign.raised,
                        credits_issued: Amount::ZERO,
                        donations_converted: 0,
                        donations_skipped: 0,
                    }));
                }
                match self.convert_campaign(campaign, conversion, now) {
                    Ok(result) => Ok(Some(result)),
                    Err(SettlementError::Campaign(CampaignError::NotClaimable { .. })) => Ok(None),
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Claim and complete a campaign that reached its target (or was
    /// force-completed).
    fn complete_campaign(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
        reason: &str,
    ) -> Result<CampaignResult, SettlementError> {
        self.campaigns.claim_for_settlement(&campaign.id, now)?;
        self.ensure_status(campaign, CampaignStatus::Completed)?;
        self.file_record_if_absent(SettlementRecord {
            id: SettlementId::new(),
            campaign_id: campaign.id,
            closure_type: ClosureType::Completed,
            final_amount: campaign.raised,
            disbursement_amount: campaign.raised,
            credits_issued: Amount::ZERO,
            donations_converted: 0,
            donations_skipped: 0,
            reason: reason.to_string(),
            settled_at: now,
        })?;
        self.campaigns.mark_processed(&campaign.id)?;

        info!(campaign = %campaign.id, raised = %campaign.raised, "campaign completed");
        Ok(CampaignResult {
            campaign_id: campaign.id,
            disposition: Disposition::Completed,
            final_amount: campaign.raised,
            credits_issued: Amount::ZERO,
            donations_converted: 0,
            donations_skipped: 0,
        })
    }

    /// Claim a campaign and convert its donations into wallet credits.
    fn convert_campaign(
        &self,
        campaign: &Campaign,
        conversion: Conversion,
        now: DateTime<Utc>,
    ) -> Result<CampaignResult, SettlementError> {
        // Refuse an illegal terminal status before taking the claim, so
        // the campaign is never left wedged in `processing`.
        self.conversion_target(campaign, &conversion)?;
        self.campaigns.claim_for_settlement(&campaign.id, now)?;
        self.finish_conversion(campaign, conversion, now)
    }

    /// Terminal status and closure type for a conversion. Refused when the
    /// campaign's current status cannot legally end there.
    fn conversion_target(
        &self,
        campaign: &Campaign,
        conversion: &Conversion,
    ) -> Result<(CampaignStatus, ClosureType), SettlementError> {
        let (status, closure) = if conversion.partial {
            (CampaignStatus::EndedPartial, ClosureType::Partial)
        } else {
            (CampaignStatus::EndedFailed, ClosureType::Failed)
        };
        let current = self
            .campaigns
            .get(&campaign.id)?
            .ok_or(SettlementError::Campaign(CampaignError::NotFound))?
            .status;
        if current != status && !current.can_transition_to(status) {
            return Err(SettlementError::NotEligible(format!(
                "status {current} cannot end as {status}"
            )));
        }
        Ok((status, closure))
    }

    /// Finish the work for an already-claimed campaign (fresh claim or
    /// stale rescue).
    fn finish_claimed(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
    ) -> Result<CampaignResult, SettlementError> {
        match self.policy.classify(campaign, now) {
            Outcome::Completed => {
                self.ensure_status(campaign, CampaignStatus::Completed)?;
                self.file_record_if_absent(SettlementRecord {
                    id: SettlementId::new(),
                    campaign_id: campaign.id,
                    closure_type: ClosureType::Completed,
                    final_amount: campaign.raised,
                    disbursement_amount: campaign.raised,
                    credits_issued: Amount::ZERO,
                    donations_converted: 0,
                    donations_skipped: 0,
                    reason: "target reached (stale claim rescue)".to_string(),
                    settled_at: now,
                })?;
                self.campaigns.mark_processed(&campaign.id)?;
                Ok(CampaignResult {
                    campaign_id: campaign.id,
                    disposition: Disposition::Completed,
                    final_amount: campaign.raised,
                    credits_issued: Amount::ZERO,
                    donations_converted: 0,
                    donations_skipped: 0,
                })
            }
            Outcome::Convert(conversion) => self.finish_conversion(campaign, conversion, now),
            Outcome::StillActive => Err(SettlementError::NotEligible(
                "claimed campaign is no longer expired".into(),
            )),
        }
    }

    fn finish_conversion(
        &self,
        campaign: &Campaign,
        conversion: Conversion,
        now: DateTime<Utc>,
    ) -> Result<CampaignResult, SettlementError> {
        // The terminal status must be reachable before any ledger write;
        // credits committed ahead of a refused transition would strand
        // the donors with no settlement record.
        let (status, closure) = self.conversion_target(campaign, &conversion)?;

        let source = EntrySource::Campaign(campaign.id);

        // Idempotence probe: entries for this campaign mean a previous
        // attempt already committed its credits. Never credit twice.
        let already_credited = self.ledger.has_entries_for_source(&source)?;

        let donations = self.donations.completed_for(&campaign.id)?;
        let mut instructions = Vec::new();
        let mut skipped = 0u64;
        for donation in &donations {
            match donation.donor {
                Some(user) => {
                    let mut metadata = Metadata::new();
                    metadata.insert("donation_id".into(), donation.id.to_string());
                    metadata.insert("channel".into(), donation.channel.label().into());
                    instructions.push(CreditInstruction {
                        user,
                        amount: donation.amount,
                        kind: EntryKind::Earn,
                        source,
                        category: "failed_campaign".into(),
                        description: format!("credit conversion for campaign '{}'", campaign.title),
                        metadata,
                    });
                }
                None => skipped += 1,
            }
        }

        let (converted, credits_issued) = if already_credited {
            warn!(campaign = %campaign.id, "conversion already committed, skipping credits");
            (0, Amount::ZERO)
        } else {
            let entries = self.ledger.credit_batch(&instructions, now)?;
            let total: Amount = entries.iter().map(|e| e.amount).sum();
            (entries.len() as u64, total)
        };

        self.ensure_status(campaign, status)?;
        self.file_record_if_absent(SettlementRecord {
            id: SettlementId::new(),
            campaign_id: campaign.id,
            closure_type: closure,
            final_amount: campaign.raised,
            disbursement_amount: Amount::ZERO,
            credits_issued,
            donations_converted: converted,
            donations_skipped: skipped,
            reason: format!(
                "deadline passed at {} bp ({:?} band)",
                campaign.success_basis_points(),
                conversion.band
            ),
            settled_at: now,
        })?;
        self.campaigns.mark_processed(&campaign.id)?;

        info!(
            campaign = %campaign.id,
            credits = %credits_issued,
            converted,
            skipped,
            "donations converted to credits"
        );

        let disposition = if already_credited {
            Disposition::Recovered
        } else if conversion.partial {
            Disposition::ConvertedPartial
        } else {
            Disposition::ConvertedFailed
        };
        Ok(CampaignResult {
            campaign_id: campaign.id,
            disposition,
            final_amount: campaign.raised,
            credits_issued,
            donations_converted: converted,
            donations_skipped: skipped,
        })
    }

    /// Move the campaign to `desired` unless it already carries it.
    fn ensure_status(
        &self,
        campaign: &Campaign,
        desired: CampaignStatus,
    ) -> Result<(), SettlementError> {
        let current = self
            .campaigns
            .get(&campaign.id)?
            .ok_or(SettlementError::Campaign(CampaignError::NotFound))?
            .status;
        if current != desired {
            self.campaigns.set_status(&campaign.id, desired)?;
        }
        Ok(())
    }

    /// File a settlement record, tolerating one already filed by an
    /// earlier attempt.
    fn file_record_if_absent(&self, record: SettlementRecord) -> Result<(), SettlementError> {
        match self.records.file(record) {
            Ok(()) | Err(SettlementError::CampaignAlreadySettled) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Manual actions report a lost claim as "already settled".
fn claim_conflict_to_already_settled(error: SettlementError) -> SettlementError {
    match error {
        SettlementError::Campaign(CampaignError::NotClaimable { .. }) => {
            SettlementError::CampaignAlreadySettled
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use galang_campaign::{ExpiryStatus, FundingType, InMemoryCampaignStore};
    use galang_ledger::{InMemoryLedger, LedgerReader};
    use galang_types::{Donation, DonationId, DonationStatus, FixedClock, PaymentChannel, UserId};

    use crate::source::InMemoryDonations;

    use super::*;

    type TestEngine =
        SettlementEngine<InMemoryCampaignStore, InMemoryLedger, InMemoryDonations, FixedClock>;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
    }

    fn engine() -> TestEngine {
        SettlementEngine::new(
            InMemoryCampaignStore::new(),
            InMemoryLedger::default(),
            InMemoryDonations::new(),
            FixedClock::at(start()),
            SettlementPolicy::default(),
        )
    }

    fn insert_campaign(engine: &TestEngine, raised: i64, deadline: DateTime<Utc>) -> CampaignId {
        let mut campaign = Campaign::active(
            UserId::new(),
            "community kitchen",
            Amount::new(1_000_000),
            deadline,
            FundingType::Fixed,
            start() - Duration::days(40),
        );
        campaign.raised = Amount::new(raised);
        let id = campaign.id;
        engine.campaigns().insert(campaign).unwrap();
        id
    }

    fn add_donation(engine: &TestEngine, campaign: CampaignId, donor: Option<UserId>, amount: i64) {
        engine.donations.add(Donation {
            id: DonationId::new(),
            campaign_id: campaign,
            donor,
            amount: Amount::new(amount),
            channel: PaymentChannel::BankTransfer,
            status: DonationStatus::Completed,
            created_at: start() - Duration::days(10),
        });
    }

    #[test]
    fn reached_target_completes_without_conversion() {
        let engine = engine();
        let id = insert_campaign(&engine, 1_000_000, start() - Duration::days(1));
        add_donation(&engine, id, Some(UserId::new()), 1_000_000);

        let summary = engine.run_batch().unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total_credits, Amount::ZERO);

        let campaign = engine.campaigns().get(&id).unwrap().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert_eq!(campaign.expiry, ExpiryStatus::Processed);
        assert!(!engine
            .ledger()
            .has_entries_for_source(&EntrySource::Campaign(id))
            .unwrap());

        let record = engine.records().get(&id).unwrap();
        assert_eq!(record.closure_type, ClosureType::Completed);
        assert!(!record.closure_type.requires_refund());
    }

    #[test]
    fn low_success_campaign_converts_each_donation() {
        let engine = engine();
        // 20% of target, fast-track band: converts immediately.
        let id = insert_campaign(&engine, 200_000, start() - Duration::days(1));
        let donors: Vec<UserId> = (0..3).map(|_| UserId::new()).collect();
        add_donation(&engine, id, Some(donors[0]), 50_000);
        add_donation(&engine, id, Some(donors[1]), 100_000);
        add_donation(&engine, id, Some(donors[2]), 50_000);

        let summary = engine.run_batch().unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total_credits, Amount::new(200_000));

        let campaign = engine.campaigns().get(&id).unwrap().unwrap();
        assert_eq!(campaign.status, CampaignStatus::EndedFailed);
        assert_eq!(campaign.expiry, ExpiryStatus::Processed);

        for (donor, expected) in donors.iter().zip([50_000, 100_000, 50_000]) {
            let wallet = engine.ledger().wallet(donor).unwrap().unwrap();
            assert_eq!(wallet.balance, Amount::new(expected));
            let entries = engine.ledger().entries(donor).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].kind, EntryKind::Earn);
            assert_eq!(entries[0].category, "failed_campaign");
            assert!(entries[0].source.references_campaign(&id));
        }

        let record = engine.records().get(&id).unwrap();
        assert_eq!(record.closure_type, ClosureType::Failed);
        assert_eq!(record.donations_converted, 3);
        assert_eq!(record.credits_issued, Amount::new(200_000));
    }

    #[test]
    fn rerun_creates_no_new_entries_or_records() {
        let engine = engine();
        let id = insert_campaign(&engine, 200_000, start() - Duration::days(1));
        let donor = UserId::new();
        add_donation(&engine, id, Some(donor), 200_000);

        engine.run_batch().unwrap();
        let record_before = engine.records().get(&id).unwrap();
        let entries_before = engine.ledger().entry_count(&donor).unwrap();

        let second = engine.run_batch().unwrap();

        assert_eq!(second.processed, 0);
        assert_eq!(second.failed, 0);
        assert_eq!(engine.ledger().entry_count(&donor).unwrap(), entries_before);
        assert_eq!(engine.records().get(&id).unwrap(), record_before);
    }

    #[test]
    fn mid_band_campaign_waits_out_grace_then_converts() {
        let engine = engine();
        // 50%, standard band: 7-day grace after the deadline.
        let id = insert_campaign(&engine, 500_000, start() - Duration::days(1));
        add_donation(&engine, id, Some(UserId::new()), 500_000);

        let first = engine.run_batch().unwrap();
        assert_eq!(first.deferred, 1);
        assert_eq!(first.processed, 0);
        assert!(matches!(
            first.results[0].disposition,
            Disposition::GracePending { .. }
        ));
        // The claim must not be held during grace.
        assert_eq!(
            engine.campaigns().get(&id).unwrap().unwrap().expiry,
            ExpiryStatus::Active
        );

        engine.clock.advance(Duration::days(7));
        let second = engine.run_batch().unwrap();
        assert_eq!(second.processed, 1);
        assert_eq!(second.total_credits, Amount::new(500_000));
    }

    #[test]
    fn campaign_reaching_target_during_grace_completes() {
        let engine = engine();
        // 80% at expiry: high-success band, 14-day grace.
        let id = insert_campaign(&engine, 800_000, start() - Duration::days(1));
        add_donation(&engine, id, Some(UserId::new()), 800_000);

        assert_eq!(engine.run_batch().unwrap().deferred, 1);

        // A late donation closes the gap before the grace runs out.
        engine.campaigns().add_raised(&id, Amount::new(200_000)).unwrap();
        engine.clock.advance(Duration::days(14));

        let summary = engine.run_batch().unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total_credits, Amount::ZERO);
        assert_eq!(
            engine.campaigns().get(&id).unwrap().unwrap().status,
            CampaignStatus::Completed
        );
    }

    #[test]
    fn unresolvable_donors_are_skipped_and_counted() {
        let engine = engine();
        let id = insert_campaign(&engine, 150_000, start() - Duration::days(1));
        let known = UserId::new();
        add_donation(&engine, id, Some(known), 100_000);
        add_donation(&engine, id, None, 50_000);

        let summary = engine.run_batch().unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.results[0].donations_converted, 1);
        assert_eq!(summary.results[0].donations_skipped, 1);
        assert_eq!(summary.total_credits, Amount::new(100_000));

        let record = engine.records().get(&id).unwrap();
        assert_eq!(record.donations_skipped, 1);
    }

    #[test]
    fn flexible_funding_ends_partial() {
        let engine = engine();
        let mut campaign = Campaign::active(
            UserId::new(),
            "open source grant",
            Amount::new(1_000_000),
            start() - Duration::days(1),
            FundingType::Flexible,
            start() - Duration::days(40),
        );
        campaign.raised = Amount::new(200_000);
        let id = campaign.id;
        engine.campaigns().insert(campaign).unwrap();
        add_donation(&engine, id, Some(UserId::new()), 200_000);

        let summary = engine.run_batch().unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(
            engine.campaigns().get(&id).unwrap().unwrap().status,
            CampaignStatus::EndedPartial
        );
        let record = engine.records().get(&id).unwrap();
        assert_eq!(record.closure_type, ClosureType::Partial);
        assert!(!record.closure_type.requires_refund());
    }

    #[test]
    fn manual_complete_bypasses_percentage() {
        let engine = engine();
        let id = insert_campaign(&engine, 400_000, start() + Duration::days(5));

        let result = engine
            .settle_campaign(&id, SettleAction::Complete)
            .unwrap();
        assert_eq!(result.disposition, Disposition::Completed);

        let campaign = engine.campaigns().get(&id).unwrap().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert_eq!(campaign.expiry, ExpiryStatus::Processed);
    }

    #[test]
    fn manual_credits_skips_grace_window() {
        let engine = engine();
        // 50%: batch would defer for 7 days; the operator converts now.
        let id = insert_campaign(&engine, 500_000, start() - Duration::days(1));
        let donor = UserId::new();
        add_donation(&engine, id, Some(donor), 500_000);

        let result = engine.settle_campaign(&id, SettleAction::Credits).unwrap();
        assert_eq!(result.disposition, Disposition::ConvertedFailed);
        assert_eq!(
            engine.ledger().wallet(&donor).unwrap().unwrap().balance,
            Amount::new(500_000)
        );
    }

    #[test]
    fn manual_credits_on_pending_campaign_touches_nothing() {
        let engine = engine();
        // Expired but never approved: pending cannot legally end as
        // ended_failed, so nothing may be claimed or credited.
        let mut campaign = Campaign::active(
            UserId::new(),
            "community kitchen",
            Amount::new(1_000_000),
            start() - Duration::days(1),
            FundingType::Fixed,
            start() - Duration::days(40),
        );
        campaign.status = CampaignStatus::Pending;
        campaign.raised = Amount::new(200_000);
        let id = campaign.id;
        engine.campaigns().insert(campaign).unwrap();
        let donor = UserId::new();
        add_donation(&engine, id, Some(donor), 200_000);

        let error = engine
            .settle_campaign(&id, SettleAction::Credits)
            .unwrap_err();
        assert!(matches!(error, SettlementError::NotEligible(_)));

        // No claim taken, no credits committed, no record filed.
        let stored = engine.campaigns().get(&id).unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Pending);
        assert_eq!(stored.expiry, ExpiryStatus::Active);
        assert!(engine.ledger().wallet(&donor).unwrap().is_none());
        assert!(!engine
            .ledger()
            .has_entries_for_source(&EntrySource::Campaign(id))
            .unwrap());
        assert!(engine.records().get(&id).is_none());

        // Nothing stale to rescue either.
        engine.clock.advance(Duration::hours(7));
        assert!(engine.recover_stale().unwrap().results.is_empty());
    }

    #[test]
    fn manual_action_on_settled_campaign_is_refused() {
        let engine = engine();
        let id = insert_campaign(&engine, 200_000, start() - Duration::days(1));
        add_donation(&engine, id, Some(UserId::new()), 200_000);
        engine.run_batch().unwrap();

        let error = engine
            .settle_campaign(&id, SettleAction::Credits)
            .unwrap_err();
        assert_eq!(error, SettlementError::CampaignAlreadySettled);
    }

    #[test]
    fn extend_reopens_campaign_for_donations() {
        let engine = engine();
        let id = insert_campaign(&engine, 500_000, start() - Duration::days(1));

        let result = engine
            .settle_campaign(&id, SettleAction::Extend { days: 14 })
            .unwrap();
        let new_deadline = start() + Duration::days(14);
        assert_eq!(
            result.disposition,
            Disposition::Extended { new_deadline }
        );

        let campaign = engine.campaigns().get(&id).unwrap().unwrap();
        assert_eq!(campaign.deadline, new_deadline);
        assert_eq!(campaign.expiry, ExpiryStatus::Active);

        // No longer selected by the batch scan.
        assert!(engine.run_batch().unwrap().results.is_empty());
    }

    #[test]
    fn preview_expiring_mutates_nothing() {
        let engine = engine();
        let id = insert_campaign(&engine, 100_000, start() + Duration::days(3));

        let upcoming = engine.preview_expiring(7).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, id);
        assert_eq!(
            engine.campaigns().get(&id).unwrap().unwrap().expiry,
            ExpiryStatus::Active
        );
    }

    #[test]
    fn stale_claim_is_rescued_once() {
        let engine = engine();
        let id = insert_campaign(&engine, 200_000, start() - Duration::days(1));
        let donor = UserId::new();
        add_donation(&engine, id, Some(donor), 200_000);

        // Simulate a run that claimed the campaign and then crashed
        // before any ledger work.
        engine.campaigns().claim_for_settlement(&id, start()).unwrap();

        // Too fresh to rescue.
        assert!(engine.recover_stale().unwrap().results.is_empty());

        engine.clock.advance(Duration::hours(7));
        let rescue = engine.recover_stale().unwrap();
        assert_eq!(rescue.processed, 1);
        assert_eq!(
            engine.ledger().wallet(&donor).unwrap().unwrap().balance,
            Amount::new(200_000)
        );
        assert_eq!(
            engine.campaigns().get(&id).unwrap().unwrap().expiry,
            ExpiryStatus::Processed
        );
    }

    #[test]
    fn rescue_after_credit_commit_never_double_credits() {
        let engine = engine();
        let id = insert_campaign(&engine, 200_000, start() - Duration::days(1));
        let donor = UserId::new();
        add_donation(&engine, id, Some(donor), 200_000);

        // Simulate a crash after the credit batch committed but before
        // the processed flip.
        engine.campaigns().claim_for_settlement(&id, start()).unwrap();
        engine
            .ledger()
            .credit_batch(
                &[CreditInstruction {
                    user: donor,
                    amount: Amount::new(200_000),
                    kind: EntryKind::Earn,
                    source: EntrySource::Campaign(id),
                    category: "failed_campaign".into(),
                    description: "credit conversion for campaign 'community kitchen'".into(),
                    metadata: Metadata::new(),
                }],
                start(),
            )
            .unwrap();

        engine.clock.advance(Duration::hours(7));
        let rescue = engine.recover_stale().unwrap();

        assert_eq!(rescue.processed, 1);
        assert!(matches!(
            rescue.results[0].disposition,
            Disposition::Recovered
        ));
        // Exactly one entry; the donor was not credited again.
        assert_eq!(engine.ledger().entry_count(&donor).unwrap(), 1);
        assert_eq!(
            engine.ledger().wallet(&donor).unwrap().unwrap().balance,
            Amount::new(200_000)
        );
        assert_eq!(
            engine.campaigns().get(&id).unwrap().unwrap().expiry,
            ExpiryStatus::Processed
        );
    }

    #[test]
    fn batch_summary_reports_partial_progress() {
        let engine = engine();
        let completed = insert_campaign(&engine, 1_000_000, start() - Duration::days(1));
        let converted = insert_campaign(&engine, 100_000, start() - Duration::days(1));
        add_donation(&engine, converted, Some(UserId::new()), 100_000);
        // 50% mid-band campaign defers.
        insert_campaign(&engine, 500_000, start() - Duration::days(1));

        let summary = engine.run_batch().unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.deferred, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total_amount, Amount::new(1_100_000));
        assert_eq!(summary.total_credits, Amount::new(100_000));
        assert_eq!(summary.results.len(), 3);
        let _ = completed;
    }
}
