use chrono::{DateTime, Utc};

use galang_ledger::LedgerError;

/// Errors produced by report generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("invalid report period: {from} is not before {to}")]
    InvalidPeriod {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
