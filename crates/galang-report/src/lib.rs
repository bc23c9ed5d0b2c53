//! Read-only financial reporting for the Galang settlement engine.
//!
//! Reports are deterministic projections over donation records and the
//! wallet ledger. Nothing here mutates; re-running a report for the same
//! period is always safe. Reports are not required to be consistent with
//! an in-flight settlement batch.

pub mod builder;
pub mod error;
pub mod period;

pub use builder::{
    ExpenseBlock, FinancialSummary, IncomeBlock, ReportBuilder, StatisticsBlock,
};
pub use error::ReportError;
pub use period::ReportPeriod;
