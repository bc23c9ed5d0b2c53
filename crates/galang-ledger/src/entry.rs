use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use galang_types::{Amount, CampaignId, DonationId, EntryId, UserId, WalletId};

/// Typed key-value metadata attached to a ledger entry.
pub type Metadata = BTreeMap<String, String>;

/// The kind of ledger mutation an entry records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Earn,
    Spend,
    TransferIn,
    TransferOut,
    Bonus,
    Refund,
}

impl EntryKind {
    /// Returns `true` if this kind increases the balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Earn | Self::TransferIn | Self::Bonus | Self::Refund)
    }

    /// Returns `true` if this kind decreases the balance.
    pub fn is_debit(&self) -> bool {
        !self.is_credit()
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earn => write!(f, "earn"),
            Self::Spend => write!(f, "spend"),
            Self::TransferIn => write!(f, "transfer_in"),
            Self::TransferOut => write!(f, "transfer_out"),
            Self::Bonus => write!(f, "bonus"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

/// What a ledger entry's value originated from.
///
/// An explicit tagged reference rather than a string-keyed dynamic lookup:
/// downstream consumers match on the variant instead of guessing what kind
/// of record an opaque id points at. These are weak references — lookup
/// only, no ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntrySource {
    Campaign(CampaignId),
    Donation(DonationId),
    Wallet(WalletId),
    None,
}

impl EntrySource {
    /// Returns `true` if this source references the given campaign.
    pub fn references_campaign(&self, campaign: &CampaignId) -> bool {
        matches!(self, Self::Campaign(id) if id == campaign)
    }
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Campaign(id) => write!(f, "{}", id.short_id()),
            Self::Donation(id) => write!(f, "{}", id.short_id()),
            Self::Wallet(id) => write!(f, "{}", id.short_id()),
            Self::None => write!(f, "none"),
        }
    }
}

/// One immutable record in a wallet's append-only entry stream.
///
/// `balance_before` and `balance_after` are captured at the moment of
/// mutation and never recomputed. Corrections are made by appending a
/// compensating entry, never by editing history. Each entry is hash-linked
/// to its predecessor so tampering is detectable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub wallet: WalletId,
    pub owner: UserId,
    /// Position in the wallet's stream, monotonic from 1.
    pub seq: u64,
    pub kind: EntryKind,
    /// Always positive; the sign is carried by `kind`.
    pub amount: Amount,
    pub source: EntrySource,
    /// Free-form category label, e.g. `"failed_campaign"` or `"transfer"`.
    pub category: String,
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub description: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    /// Hash of the previous entry in this wallet's stream.
    pub prev_hash: Option<[u8; 32]>,
    /// BLAKE3 hash of this entry with `entry_hash` zeroed.
    pub entry_hash: [u8; 32],
}

impl LedgerEntry {
    /// The amount with its sign applied: positive for credits, negative
    /// for debits.
    pub fn signed_amount(&self) -> Amount {
        if self.kind.is_credit() {
            self.amount
        } else {
            Amount::ZERO - self.amount
        }
    }

    /// Short hex form of the entry hash for logs and display.
    pub fn short_hash(&self) -> String {
        hex::encode(&self.entry_hash[..6])
    }
}
