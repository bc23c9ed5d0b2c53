//! Virtual wallet ledger for the Galang settlement engine.
//!
//! This crate is the value-bearing heart of the system. It provides:
//! - Wallet and append-only ledger entry types with hash-linked integrity
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger` implementation for tests and embedding
//! - Deterministic replay of a wallet's entry stream back into its balance
//! - Stream validation (hash chain, sequence, balance arithmetic)
//!
//! Every mutation executes as one atomic unit: the balance update and the
//! entry append either both happen or neither does, and concurrent
//! operations on the same wallet never interleave their
//! read-balance/write-balance steps.

pub mod entry;
pub mod error;
pub mod memory;
pub mod replay;
pub mod traits;
pub mod validation;
pub mod wallet;

pub use entry::{EntryKind, EntrySource, LedgerEntry, Metadata};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use replay::{ReplayEngine, ReplayResult};
pub use traits::{CreditInstruction, EntryFilter, LedgerReader, LedgerWriter, TransferReceipt};
pub use validation::{StreamValidator, ValidationReport, Violation, ViolationKind};
pub use wallet::{TierSchedule, Wallet, WalletTier};
