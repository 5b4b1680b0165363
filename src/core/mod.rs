pub mod error;
pub mod transaction;
pub mod ledger;

pub use error::{LedgerError, LedgerResult, TransactionError};
pub use transaction::{Amount, Transaction};
pub use ledger::Ledger;
