mod core;
pub mod backend;
pub mod config;
pub mod page;

pub use crate::core::{Amount, Ledger, LedgerError, Transaction, TransactionError};
pub use crate::core::{error, ledger, transaction};
