use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;

use galang_types::{Amount, EntryId, UserId};

use crate::entry::{EntryKind, EntrySource, LedgerEntry, Metadata};
use crate::error::LedgerError;
use crate::traits::{CreditInstruction, EntryFilter, LedgerReader, LedgerWriter, TransferReceipt};
use crate::wallet::{TierSchedule, Wallet};

/// In-memory wallet ledger for tests, local demos, and embedding.
///
/// A single `RwLock` write guard scopes every mutation, so the balance
/// check and balance write of an operation can never be interleaved by a
/// concurrent one — the in-memory equivalent of row-level locking.
pub struct InMemoryLedger {
    schedule: TierSchedule,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<UserId, Wallet>,
    streams: HashMap<UserId, Vec<LedgerEntry>>,
    source_index: HashMap<EntrySource, u64>,
}

impl InMemoryLedger {
    pub fn new(schedule: TierSchedule) -> Self {
        Self {
            schedule,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// The tier schedule in effect.
    pub fn schedule(&self) -> &TierSchedule {
        &self.schedule
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::StoreError("ledger write lock poisoned".into()))
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::StoreError("ledger read lock poisoned".into()))
    }

    /// Apply one credit inside an already-held write guard.
    #[allow(clippy::too_many_arguments)]
    fn apply_credit(
        &self,
        state: &mut LedgerState,
        user: UserId,
        amount: Amount,
        kind: EntryKind,
        source: EntrySource,
        category: &str,
        description: &str,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if !kind.is_credit() {
            return Err(LedgerError::StoreError(format!(
                "credit called with debit kind {kind}"
            )));
        }

        // Validate arithmetic before touching the wallet so a failure
        // leaves no partial state.
        let current = state.wallets.get(&user);
        let before = current.map(|w| w.balance).unwrap_or(Amount::ZERO);
        let earned = current.map(|w| w.total_earned).unwrap_or(Amount::ZERO);
        let after = before
            .checked_add(amount)
            .map_err(|_| LedgerError::AmountOverflow)?;
        let total_earned = earned
            .checked_add(amount)
            .map_err(|_| LedgerError::AmountOverflow)?;

        let wallet = state
            .wallets
            .entry(user)
            .or_insert_with(|| Wallet::open(user, now));
        wallet.balance = after;
        wallet.total_earned = total_earned;
        wallet.tier = self.schedule.tier_for(total_earned);
        wallet.last_activity = now;
        let wallet_id = wallet.id;

        Self::append_entry(
            state,
            user,
            LedgerEntry {
                id: EntryId::new(),
                wallet: wallet_id,
                owner: user,
                seq: 0,
                kind,
                amount,
                source,
                category: category.to_string(),
                balance_before: before,
                balance_after: after,
                description: description.to_string(),
                metadata,
                created_at: now,
                prev_hash: None,
                entry_hash: [0; 32],
            },
        )
    }

    /// Apply one debit inside an already-held write guard.
    #[allow(clippy::too_many_arguments)]
    fn apply_debit(
        &self,
        state: &mut LedgerState,
        user: UserId,
        amount: Amount,
        kind: EntryKind,
        source: EntrySource,
        category: &str,
        description: &str,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        // A user with no wallet has nothing to spend.
        let available = state
            .wallets
            .get(&user)
            .map(|w| w.balance)
            .unwrap_or(Amount::ZERO);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let wallet = state
            .wallets
            .get_mut(&user)
            .ok_or(LedgerError::WalletNotFound)?;
        let before = wallet.balance;
        let after = before - amount;
        wallet.balance = after;
        wallet.total_spent = wallet
            .total_spent
            .checked_add(amount)
            .map_err(|_| LedgerError::AmountOverflow)?;
        wallet.last_activity = now;
        let wallet_id = wallet.id;

        Self::append_entry(
            state,
            user,
            LedgerEntry {
                id: EntryId::new(),
                wallet: wallet_id,
                owner: user,
                seq: 0,
                kind,
                amount,
                source,
                category: category.to_string(),
                balance_before: before,
                balance_after: after,
                description: description.to_string(),
                metadata,
                created_at: now,
                prev_hash: None,
                entry_hash: [0; 32],
            },
        )
    }

    /// Chain an entry onto the end of the user's stream.
    fn append_entry(
        state: &mut LedgerState,
        user: UserId,
        mut entry: LedgerEntry,
    ) -> Result<LedgerEntry, LedgerError> {
        let stream = state.streams.entry(user).or_default();
        entry.seq = stream.len() as u64 + 1;
        entry.prev_hash = stream.last().map(|e| e.entry_hash);
        entry.entry_hash = compute_entry_hash(&entry)?;

        *state.source_index.entry(entry.source).or_insert(0) += 1;
        stream.push(entry.clone());
        Ok(entry)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(TierSchedule::default())
    }
}

impl LedgerWriter for InMemoryLedger {
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
    ) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.write_state()?;
        self.apply_credit(
            &mut state, user, amount, kind, source, category, description, metadata, now,
        )
    }

    fn credit_batch(
        &self,
        instructions: &[CreditInstruction],
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut state = self.write_state()?;

        // Validate the whole batch against projected balances first, so a
        // bad instruction in the middle leaves nothing applied.
        let mut projected: HashMap<UserId, (Amount, Amount)> = HashMap::new();
        for instruction in instructions {
            if !instruction.amount.is_positive() {
                return Err(LedgerError::NonPositiveAmount(instruction.amount));
            }
            if !instruction.kind.is_credit() {
                return Err(LedgerError::StoreError(format!(
                    "credit batch contains debit kind {}",
                    instruction.kind
                )));
            }
            let (balance, earned) = projected
                .get(&instruction.user)
                .copied()
                .or_else(|| {
                    state
                        .wallets
                        .get(&instruction.user)
                        .map(|w| (w.balance, w.total_earned))
                })
                .unwrap_or((Amount::ZERO, Amount::ZERO));
            let balance = balance
                .checked_add(instruction.amount)
                .map_err(|_| LedgerError::AmountOverflow)?;
            let earned = earned
                .checked_add(instruction.amount)
                .map_err(|_| LedgerError::AmountOverflow)?;
            projected.insert(instruction.user, (balance, earned));
        }

        let mut entries = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            let entry = self.apply_credit(
                &mut state,
                instruction.user,
                instruction.amount,
                instruction.kind,
                instruction.source,
                &instruction.category,
                &instruction.description,
                instruction.metadata.clone(),
                now,
            )?;
            entries.push(entry);
        }
        debug!(count = entries.len(), "credit batch applied");
        Ok(entries)
    }

    fn debit(
        &self,
        user: UserId,
        amount: Amount,
        source: EntrySource,
        category: &str,
        description: &str,
        metadata: Metadata,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.write_state()?;
        self.apply_debit(
            &mut state,
            user,
            amount,
            EntryKind::Spend,
            source,
            category,
            description,
            metadata,
            now,
        )
    }

    fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: Amount,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<TransferReceipt, LedgerError> {
        if from == to {
            return Err(LedgerError::SelfTransfer);
        }
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount));
        }

        let mut state = self.write_state()?;

        // Check the sender first so a refused transfer creates nothing,
        // not even the recipient's wallet.
        let available = state
            .wallets
            .get(&from)
            .map(|w| w.balance)
            .unwrap_or(Amount::ZERO);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let from_wallet_id = state
            .wallets
            .get(&from)
            .map(|w| w.id)
            .ok_or(LedgerError::WalletNotFound)?;
        let to_wallet_id = state
            .wallets
            .entry(to)
            .or_insert_with(|| Wallet::open(to, now))
            .id;

        let debit = self.apply_debit(
            &mut state,
            from,
            amount,
            EntryKind::TransferOut,
            EntrySource::Wallet(to_wallet_id),
            "transfer",
            description,
            Metadata::new(),
            now,
        )?;
        let credit = self.apply_credit(
            &mut state,
            to,
            amount,
            EntryKind::TransferIn,
            EntrySource::Wallet(from_wallet_id),
            "transfer",
            description,
            Metadata::new(),
            now,
        )?;

        debug!(from = %from, to = %to, amount = %amount, "transfer applied");
        Ok(TransferReceipt { debit, credit })
    }
}

impl LedgerReader for InMemoryLedger {
    fn wallet(&self, user: &UserId) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.read_state()?.wallets.get(user).cloned())
    }

    fn entries(&self, user: &UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .read_state()?
            .streams
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    fn entries_filtered(
        &self,
        user: &UserId,
        filter: &EntryFilter,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.read_state()?;
        let Some(stream) = state.streams.get(user) else {
            return Ok(vec![]);
        };
        let page = stream
            .iter()
            .filter(|entry| filter.matches(entry))
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(page)
    }

    fn entry_count(&self, user: &UserId) -> Result<u64, LedgerError> {
        Ok(self
            .read_state()?
            .streams
            .get(user)
            .map(|s| s.len() as u64)
            .unwrap_or(0))
    }

    fn has_entries_for_source(&self, source: &EntrySource) -> Result<bool, LedgerError> {
        Ok(self
            .read_state()?
            .source_index
            .get(source)
            .copied()
            .unwrap_or(0)
            > 0)
    }

    fn users(&self) -> Result<Vec<UserId>, LedgerError> {
        let state = self.read_state()?;
        let mut users: Vec<_> = state.wallets.keys().copied().collect();
        users.sort();
        Ok(users)
    }
}

fn compute_entry_hash(entry: &LedgerEntry) -> Result<[u8; 32], LedgerError> {
    let mut canonical = entry.clone();
    canonical.entry_hash = [0; 32];

    let encoded =
        serde_json::to_vec(&canonical).map_err(|e| LedgerError::Serialization(e.to_string()))?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(b"galang-entry-v1:");
    hasher.update(&encoded);
    Ok(*hasher.finalize().as_bytes())
}

/// Recompute the hash an entry should carry. Exposed for stream validation.
pub(crate) fn recompute_entry_hash(entry: &LedgerEntry) -> Result<[u8; 32], LedgerError> {
    compute_entry_hash(entry)
}
