use thiserror::Error;

use crate::backend::BackendError;
use crate::core::transaction::Amount;

/// Problems with the contents of a single transfer record.
#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("recipient must not be empty")]
    EmptyRecipient,
    #[error("amount must be a positive number, got {0}")]
    InvalidAmount(Amount),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The transfer itself is malformed (empty recipient, bad amount).
    #[error("invalid transfer: {0}")]
    InvalidTransfer(#[from] TransactionError),
    /// Occurs when a transfer asks for more than the current balance.
    #[error("insufficient balance: {amount} requested, {balance} available")]
    InsufficientBalance {
        amount: Amount,
        balance: Amount
    },
    /// A stored value under `key` could not be turned back into ledger state.
    #[error("stored value for '{key}' is malformed: {reason}")]
    CorruptStore {
        key: String,
        reason: String
    },
    #[error("failed to encode transaction history")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] BackendError),
}

impl LedgerError {
    /// True for the failures a user can fix by changing their input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidTransfer(_) | Self::InsufficientBalance { .. })
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
