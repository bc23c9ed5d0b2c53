use galang_types::{Amount, UserId};

use crate::error::LedgerError;
use crate::traits::LedgerReader;

/// Result of replaying a wallet's entry stream into balances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub user: UserId,
    pub entries_applied: u64,
    pub balance: Amount,
    pub total_earned: Amount,
    pub total_spent: Amount,
}

/// Deterministic replay over wallet entry streams.
///
/// Replaying every entry in creation order must reconstruct the stored
/// wallet exactly — this is the executable form of the balance invariant.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Rebuild a wallet's balances purely from its entry stream.
    pub fn replay<R: LedgerReader>(
        reader: &R,
        user: &UserId,
    ) -> Result<ReplayResult, LedgerError> {
        let entries = reader.entries(user)?;
        let mut balance = Amount::ZERO;
        let mut total_earned = Amount::ZERO;
        let mut total_spent = Amount::ZERO;

        for entry in &entries {
            if entry.kind.is_credit() {
                total_earned = total_earned
                    .checked_add(entry.amount)
                    .map_err(|_| LedgerError::AmountOverflow)?;
            } else {
                total_spent = total_spent
                    .checked_add(entry.amount)
                    .map_err(|_| LedgerError::AmountOverflow)?;
            }
            balance = balance
                .checked_add(entry.signed_amount())
                .map_err(|_| LedgerError::AmountOverflow)?;
        }

        Ok(ReplayResult {
            user: *user,
            entries_applied: entries.len() as u64,
            balance,
            total_earned,
            total_spent,
        })
    }

    /// Returns `true` if the stored wallet matches its replayed stream.
    /// A user with no wallet and no entries verifies trivially.
    pub fn verify_wallet<R: LedgerReader>(
        reader: &R,
        user: &UserId,
    ) -> Result<bool, LedgerError> {
        let replayed = Self::replay(reader, user)?;
        match reader.wallet(user)? {
            Some(wallet) => Ok(wallet.balance == replayed.balance
                && wallet.total_earned == replayed.total_earned
                && wallet.total_spent == replayed.total_spent),
            None => Ok(replayed.entries_applied == 0),
        }
    }
}
