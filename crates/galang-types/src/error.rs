use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("amount arithmetic overflow")]
    AmountOverflow,

    #[error("serialization error: {0}")]
    Serialization(String),
}
