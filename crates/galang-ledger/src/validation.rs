use galang_types::UserId;

use crate::error::LedgerError;
use crate::memory::recompute_entry_hash;
use crate::traits::LedgerReader;

/// Result of validating a wallet's entry stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub user: UserId,
    pub entry_count: u64,
    pub hash_chain_valid: bool,
    pub sequence_monotonic: bool,
    pub arithmetic_valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    HashChainBreak,
    HashMismatch,
    BalanceArithmetic,
    NonPositiveAmount,
}

/// Entry stream integrity validator.
///
/// Checks that the stream is what an append-only ledger must be: sequences
/// contiguous from 1, every entry hash-linked to its predecessor, every
/// hash recomputable from the entry's contents, and every
/// `balance_before`/`balance_after` pair consistent with the signed amount
/// and with the neighbouring entries.
pub struct StreamValidator;

impl StreamValidator {
    /// Validate one user's stream against all invariants.
    pub fn validate_stream<R: LedgerReader>(
        reader: &R,
        user: &UserId,
    ) -> Result<ValidationReport, LedgerError> {
        let entries = reader.entries(user)?;
        let mut violations = Vec::new();
        let mut hash_chain_valid = true;
        let mut sequence_monotonic = true;
        let mut arithmetic_valid = true;

        for (index, entry) in entries.iter().enumerate() {
            let expected_seq = (index + 1) as u64;
            if entry.seq != expected_seq {
                sequence_monotonic = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", entry.seq),
                });
            }

            let expected_prev = if index == 0 {
                None
            } else {
                Some(entries[index - 1].entry_hash)
            };
            if entry.prev_hash != expected_prev {
                hash_chain_valid = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            if let Ok(computed) = recompute_entry_hash(entry) {
                if computed != entry.entry_hash {
                    hash_chain_valid = false;
                    violations.push(Violation {
                        seq: entry.seq,
                        kind: ViolationKind::HashMismatch,
                        description: "entry hash does not match computed".into(),
                    });
                }
            }

            if !entry.amount.is_positive() {
                arithmetic_valid = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::NonPositiveAmount,
                    description: format!("entry amount {} is not positive", entry.amount),
                });
            }

            if entry.balance_after != entry.balance_before + entry.signed_amount() {
                arithmetic_valid = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::BalanceArithmetic,
                    description: "balance_after does not equal balance_before plus signed amount"
                        .into(),
                });
            }

            if index > 0 && entry.balance_before != entries[index - 1].balance_after {
                arithmetic_valid = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::BalanceArithmetic,
                    description: "balance_before does not continue from previous entry".into(),
                });
            }
        }

        Ok(ValidationReport {
            user: *user,
            entry_count: entries.len() as u64,
            hash_chain_valid,
            sequence_monotonic,
            arithmetic_valid,
            violations,
        })
    }

    /// Fail-fast form of [`Self::validate_stream`]: the first violation
    /// found becomes the error.
    pub fn assert_stream<R: LedgerReader>(
        reader: &R,
        user: &UserId,
    ) -> Result<(), LedgerError> {
        let report = Self::validate_stream(reader, user)?;
        match report.violations.into_iter().next() {
            Some(violation) => Err(LedgerError::IntegrityViolation {
                seq: violation.seq,
                reason: violation.description,
            }),
            None => Ok(()),
        }
    }

    /// Validate every wallet in the ledger.
    pub fn validate_all<R: LedgerReader>(
        reader: &R,
    ) -> Result<Vec<ValidationReport>, LedgerError> {
        let users = reader.users()?;
        let mut reports = Vec::new();
        for user in &users {
            reports.push(Self::validate_stream(reader, user)?);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use galang_types::Amount;

    use crate::entry::{EntryKind, EntrySource, Metadata};
    use crate::memory::InMemoryLedger;
    use crate::traits::LedgerWriter;

    use super::*;

    fn seeded_ledger(user: UserId) -> InMemoryLedger {
        let ledger = InMemoryLedger::default();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        ledger
            .credit(
                user,
                Amount::new(100_000),
                EntryKind::Earn,
                EntrySource::None,
                "test",
                "earn",
                Metadata::new(),
                now,
            )
            .unwrap();
        ledger
            .debit(
                user,
                Amount::new(25_000),
                EntrySource::None,
                "purchase",
                "spend",
                Metadata::new(),
                now,
            )
            .unwrap();
        ledger
    }

    #[test]
    fn valid_stream_passes_all_checks() {
        let user = UserId::new();
        let ledger = seeded_ledger(user);

        let report = StreamValidator::validate_stream(&ledger, &user).unwrap();
        assert!(report.is_valid());
        assert!(report.hash_chain_valid);
        assert!(report.sequence_monotonic);
        assert!(report.arithmetic_valid);
        assert_eq!(report.entry_count, 2);
    }

    #[test]
    fn empty_stream_is_valid() {
        let ledger = InMemoryLedger::default();
        let user = UserId::new();
        let report = StreamValidator::validate_stream(&ledger, &user).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.entry_count, 0);
    }

    #[test]
    fn assert_stream_passes_for_intact_stream() {
        let user = UserId::new();
        let ledger = seeded_ledger(user);
        assert_eq!(StreamValidator::assert_stream(&ledger, &user), Ok(()));
    }

    #[test]
    fn validate_all_covers_every_wallet() {
        let ledger = InMemoryLedger::default();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        for _ in 0..3 {
            ledger
                .credit(
                    UserId::new(),
                    Amount::new(10_000),
                    EntryKind::Earn,
                    EntrySource::None,
                    "test",
                    "earn",
                    Metadata::new(),
                    now,
                )
                .unwrap();
        }

        let reports = StreamValidator::validate_all(&ledger).unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(ValidationReport::is_valid));
    }
}
