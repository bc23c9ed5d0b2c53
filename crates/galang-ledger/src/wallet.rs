use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galang_types::{Amount, UserId, WalletId};

/// Loyalty tier derived from lifetime earned credit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl fmt::Display for WalletTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bronze => write!(f, "bronze"),
            Self::Silver => write!(f, "silver"),
            Self::Gold => write!(f, "gold"),
            Self::Platinum => write!(f, "platinum"),
        }
    }
}

/// Thresholds mapping lifetime earned credit to a tier.
///
/// Tier is always re-derived from `total_earned` against this schedule,
/// never patched incrementally, so the derived value cannot drift.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierSchedule {
    pub silver: Amount,
    pub gold: Amount,
    pub platinum: Amount,
}

impl Default for TierSchedule {
    fn default() -> Self {
        Self {
            silver: Amount::new(1_000_000),
            gold: Amount::new(5_000_000),
            platinum: Amount::new(20_000_000),
        }
    }
}

impl TierSchedule {
    /// The tier for a lifetime earned total. Pure and idempotent.
    pub fn tier_for(&self, total_earned: Amount) -> WalletTier {
        if total_earned >= self.platinum {
            WalletTier::Platinum
        } else if total_earned >= self.gold {
            WalletTier::Gold
        } else if total_earned >= self.silver {
            WalletTier::Silver
        } else {
            WalletTier::Bronze
        }
    }
}

/// A user's virtual wallet.
///
/// Invariants, enforced by the ledger at every mutation:
/// - `balance == total_earned - total_spent`
/// - `balance >= 0` (a debit that would go negative is refused)
/// - `tier == schedule.tier_for(total_earned)`
///
/// Wallets are created lazily the first time a user needs one and are
/// never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner: UserId,
    pub balance: Amount,
    pub total_earned: Amount,
    pub total_spent: Amount,
    pub tier: WalletTier,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Wallet {
    /// A fresh zero-balance wallet for `owner`.
    pub fn open(owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: WalletId::new(),
            owner,
            balance: Amount::ZERO,
            total_earned: Amount::ZERO,
            total_spent: Amount::ZERO,
            tier: WalletTier::Bronze,
            created_at: now,
            last_activity: now,
        }
    }

    /// Returns `true` if `balance == total_earned - total_spent`.
    pub fn balances_consistent(&self) -> bool {
        self.balance == self.total_earned - self.total_spent
    }
}
