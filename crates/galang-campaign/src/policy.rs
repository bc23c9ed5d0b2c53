use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::Campaign;

/// Which credit-conversion band an under-target campaign falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionBand {
    /// Below the standard band: convert with little or no grace.
    FastTrack,
    /// The middle band: the campaign's configured grace period applies.
    Standard,
    /// A near miss: extended grace before converting, giving the campaign
    /// the benefit of the doubt.
    HighSuccess,
}

/// A classified credit-conversion outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub band: ConversionBand,
    /// Days after the deadline before the conversion executes.
    pub grace_days: i64,
    /// `true` ends the campaign as `ended_partial`, `false` as
    /// `ended_failed`.
    pub partial: bool,
}

/// The outcome the guard-rule table assigns to a campaign at an instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Target reached — completes regardless of deadline or current band.
    Completed,
    /// Deadline passed without reaching target: convert donations.
    Convert(Conversion),
    /// Deadline not passed and target not reached: nothing to do.
    StillActive,
}

/// The guard-rule table for campaign settlement, parameterized entirely by
/// configuration.
///
/// The band boundaries and grace-period lengths replace a family of
/// historically inconsistent status-correction routines; the defaults
/// encode the 30/70/100 bands and 0/7/14-day grace and remain subject to
/// product-owner confirmation, which is why none of them is a constant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SettlementPolicy {
    /// Basis points at or above which a campaign completes (10_000 = 100%).
    pub completion_bp: u32,
    /// Lower bound of the standard band, in basis points.
    pub standard_band_bp: u32,
    /// Lower bound of the high-success band, in basis points.
    pub high_band_bp: u32,
    /// Grace days for the fast-track band.
    pub fast_track_grace_days: i64,
    /// Grace days for the standard band.
    pub standard_grace_days: i64,
    /// Grace days for the high-success band.
    pub high_success_grace_days: i64,
    /// Hours after which a `processing` claim is considered stale and
    /// eligible for rescue.
    pub stale_claim_hours: i64,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            completion_bp: 10_000,
            standard_band_bp: 3_000,
            high_band_bp: 7_000,
            fast_track_grace_days: 0,
            standard_grace_days: 7,
            high_success_grace_days: 14,
            stale_claim_hours: 6,
        }
    }
}

impl SettlementPolicy {
    /// Classify a campaign's settlement outcome at `now`.
    ///
    /// The target-reached rule has priority over everything else: a
    /// campaign at 100% completes even one second past its deadline, and
    /// even if a conversion grace window had already opened.
    pub fn classify(&self, campaign: &Campaign, now: DateTime<Utc>) -> Outcome {
        let bp = campaign.success_basis_points();
        if bp >= self.completion_bp && campaign.target_reached() {
            return Outcome::Completed;
        }
        if !campaign.past_deadline(now) {
            return Outcome::StillActive;
        }

        let band = if bp < self.standard_band_bp {
            ConversionBand::FastTrack
        } else if bp < self.high_band_bp {
            ConversionBand::Standard
        } else {
            ConversionBand::HighSuccess
        };

        Outcome::Convert(Conversion {
            band,
            grace_days: self.grace_days(band),
            partial: campaign.qualifies_partial(),
        })
    }

    /// Grace days for a band.
    pub fn grace_days(&self, band: ConversionBand) -> i64 {
        match band {
            ConversionBand::FastTrack => self.fast_track_grace_days,
            ConversionBand::Standard => self.standard_grace_days,
            ConversionBand::HighSuccess => self.high_success_grace_days,
        }
    }

    /// The instant a conversion becomes executable for this campaign.
    pub fn convert_after(&self, campaign: &Campaign, band: ConversionBand) -> DateTime<Utc> {
        campaign.deadline + Duration::days(self.grace_days(band))
    }

    /// The instant at which a claim taken at `claimed_at` becomes stale.
    pub fn claim_stale_after(&self, claimed_at: DateTime<Utc>) -> DateTime<Utc> {
        claimed_at + Duration::hours(self.stale_claim_hours)
    }
}
