use chrono::{DateTime, Utc};

use galang_types::{Amount, UserId};

use crate::entry::{EntryKind, EntrySource, LedgerEntry, Metadata};
use crate::error::LedgerError;
use crate::wallet::Wallet;

/// One credit to apply as part of an all-or-nothing batch.
#[derive(Clone, Debug)]
pub struct CreditInstruction {
    pub user: UserId,
    pub amount: Amount,
    pub kind: EntryKind,
    pub source: EntrySource,
    pub category: String,
    pub description: String,
    pub metadata: Metadata,
}

/// Both legs of a completed transfer.
#[derive(Clone, Debug)]
pub struct TransferReceipt {
    pub debit: LedgerEntry,
    pub credit: LedgerEntry,
}

/// Filter for paging through a wallet's entry stream.
#[derive(Clone, Debug, Default)]
pub struct EntryFilter {
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl EntryFilter {
    /// Returns `true` if the entry passes every set criterion.
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(kind) = self.kind {
            if entry.kind != kind {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &entry.category != category {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.created_at >= to {
                return false;
            }
        }
        true
    }
}

/// Write boundary for wallet ledger mutations.
///
/// All implementations must satisfy these invariants:
/// - Every operation is one atomic unit: the wallet update and the entry
///   append both persist, or neither does.
/// - Mutations on the same wallet serialize; the balance check and the
///   balance write of a debit cannot be interleaved by another operation.
/// - Wallets are created lazily on first credit.
/// - `now` is supplied by the caller so time is injectable.
pub trait LedgerWriter: Send + Sync {
    /// Credit a wallet. Always permitted for positive amounts; returns the
    /// appended entry.
    #[allow(clippy::too_many_arguments)]
    fn credit(
        &self,
        user: UserId,
        amount: Amount,
        kind: EntryKind,
        source: EntrySource,
        category: &str,
        description: &str,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Apply a batch of credits as one atomic unit. If any instruction is
    /// invalid, nothing is applied.
    fn credit_batch(
        &self,
        instructions: &[CreditInstruction],
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Debit a wallet. Fails with `InsufficientBalance` (no mutation) if
    /// the balance does not cover the amount.
    fn debit(
        &self,
        user: UserId,
        amount: Amount,
        source: EntrySource,
        category: &str,
        description: &str,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Move value between two wallets, all-or-nothing. The two entries
    /// cross-reference each other's wallet id as their source.
    fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: Amount,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<TransferReceipt, LedgerError>;
}

/// Read boundary for wallet and entry queries.
pub trait LedgerReader: Send + Sync {
    /// The user's wallet, or `None` if one was never created.
    fn wallet(&self, user: &UserId) -> Result<Option<Wallet>, LedgerError>;

    /// The full entry stream for a user, in creation order.
    fn entries(&self, user: &UserId) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// A filtered page of the user's entry stream.
    fn entries_filtered(
        &self,
        user: &UserId,
        filter: &EntryFilter,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Number of entries in the user's stream.
    fn entry_count(&self, user: &UserId) -> Result<u64, LedgerError>;

    /// Returns `true` if any entry anywhere in the ledger carries this
    /// source. Used as the settlement idempotence probe.
    fn has_entries_for_source(&self, source: &EntrySource) -> Result<bool, LedgerError>;

    /// All users holding a wallet.
    fn users(&self) -> Result<Vec<UserId>, LedgerError>;
}
