use galang_types::Amount;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Amount,
        requested: Amount,
    },

    #[error("ledger amounts must be positive, got {0}")]
    NonPositiveAmount(Amount),

    #[error("cannot transfer a wallet to itself")]
    SelfTransfer,

    #[error("amount arithmetic overflow")]
    AmountOverflow,

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("wallet not found for user")]
    WalletNotFound,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    StoreError(String),
}
