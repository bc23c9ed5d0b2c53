use chrono::{DateTime, Duration, TimeZone, Utc};

use galang_campaign::{Campaign, CampaignStore, FundingType, InMemoryCampaignStore, SettlementPolicy};
use galang_ledger::InMemoryLedger;
use galang_settlement::{InMemoryDonations, SettlementEngine};
use galang_types::{
    Amount, CampaignId, Donation, DonationId, DonationStatus, FixedClock, PaymentChannel, UserId,
};

pub type DemoEngine =
    SettlementEngine<InMemoryCampaignStore, InMemoryLedger, InMemoryDonations, FixedClock>;

/// A seeded in-memory world the CLI commands operate on.
///
/// Campaign and donor lists keep insertion order so commands can address
/// them by number and name.
pub struct DemoWorld {
    pub engine: DemoEngine,
    pub donors: Vec<(&'static str, UserId)>,
    pub campaigns: Vec<(&'static str, CampaignId)>,
    pub donations: Vec<Donation>,
    pub now: DateTime<Utc>,
}

impl DemoWorld {
    pub fn donor(&self, name: &str) -> Option<UserId> {
        self.donors
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, id)| *id)
    }

    /// Campaign by 1-based number as listed by `campaigns`.
    pub fn campaign(&self, number: usize) -> Option<CampaignId> {
        number
            .checked_sub(1)
            .and_then(|i| self.campaigns.get(i))
            .map(|(_, id)| *id)
    }
}

/// Build the demo dataset: one completed campaign, one fast-track
/// conversion, one campaign inside its grace window, one flexible partial
/// past grace, and one still collecting.
pub fn seed() -> DemoWorld {
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
    let organizer = UserId::new();
    let donors = vec![
        ("andi", UserId::new()),
        ("budi", UserId::new()),
        ("citra", UserId::new()),
        ("dewi", UserId::new()),
    ];

    let campaigns = InMemoryCampaignStore::new();
    let donation_store = InMemoryDonations::new();
    let mut donations = Vec::new();
    let mut listing = Vec::new();

    let mut add_campaign = |title: &'static str,
                            target: i64,
                            deadline: DateTime<Utc>,
                            funding: FundingType,
                            gifts: &[(Option<UserId>, i64, PaymentChannel)]| {
        let mut campaign = Campaign::active(
            organizer,
            title,
            Amount::new(target),
            deadline,
            funding,
            now - Duration::days(45),
        );
        let raised: i64 = gifts.iter().map(|(_, amount, _)| amount).sum();
        campaign.raised = Amount::new(raised);
        let id = campaign.id;
        // Insert into a fresh store; ids are new, so this cannot collide.
        if campaigns.insert(campaign).is_ok() {
            listing.push((title, id));
        }
        for &(donor, amount, channel) in gifts {
            let donation = Donation {
                id: DonationId::new(),
                campaign_id: id,
                donor,
                amount: Amount::new(amount),
                channel,
                status: DonationStatus::Completed,
                created_at: now - Duration::days(5),
            };
            donation_store.add(donation.clone());
            donations.push(donation);
        }
    };

    add_campaign(
        "community well",
        2_000_000,
        now - Duration::days(1),
        FundingType::Fixed,
        &[
            (Some(donors[0].1), 800_000, PaymentChannel::BankTransfer),
            (Some(donors[1].1), 700_000, PaymentChannel::EWallet),
            (Some(donors[2].1), 500_000, PaymentChannel::Qris),
        ],
    );
    add_campaign(
        "school library",
        1_000_000,
        now - Duration::days(2),
        FundingType::Fixed,
        &[
            (Some(donors[0].1), 50_000, PaymentChannel::Qris),
            (Some(donors[3].1), 100_000, PaymentChannel::Card),
            (None, 50_000, PaymentChannel::Other),
        ],
    );
    add_campaign(
        "river cleanup",
        1_000_000,
        now - Duration::days(1),
        FundingType::Fixed,
        &[
            (Some(donors[1].1), 300_000, PaymentChannel::BankTransfer),
            (Some(donors[2].1), 200_000, PaymentChannel::EWallet),
        ],
    );
    add_campaign(
        "harvest share",
        1_000_000,
        now - Duration::days(8),
        FundingType::Flexible,
        &[
            (Some(donors[2].1), 400_000, PaymentChannel::BankTransfer),
            (Some(donors[3].1), 250_000, PaymentChannel::Qris),
        ],
    );
    add_campaign(
        "food bank van",
        1_500_000,
        now + Duration::days(3),
        FundingType::Fixed,
        &[(Some(donors[0].1), 300_000, PaymentChannel::EWallet)],
    );

    let engine = SettlementEngine::new(
        campaigns,
        InMemoryLedger::default(),
        donation_store,
        FixedClock::at(now),
        SettlementPolicy::default(),
    );

    DemoWorld {
        engine,
        donors,
        campaigns: listing,
        donations,
        now,
    }
}
