use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::backend::KeyValueStore;
use crate::config::CorruptDataPolicy;
use crate::core::error::{LedgerError, LedgerResult, TransactionError};
use crate::core::transaction::{Amount, Transaction, format_amount};

pub const INITIAL_BALANCE: Amount = 10000.0;

pub const BALANCE_KEY: &str = "balance";
pub const HISTORY_KEY: &str = "transactionHistory";

/// The balance and the transfers sent from it, in the order they were made.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    balance: Amount,
    transactions: Vec<Transaction>
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::with_balance(INITIAL_BALANCE)
    }
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    pub fn with_balance(balance: Amount) -> Ledger {
        Ledger { balance, transactions: Vec::new() }
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Loads whatever the store holds over the current state. Missing keys
    /// keep their current values; malformed ones are an error.
    pub fn hydrate(&mut self, store: &impl KeyValueStore) -> LedgerResult<()> {
        self.hydrate_with(store, CorruptDataPolicy::Fail)
    }

    pub fn hydrate_with(&mut self, store: &impl KeyValueStore, policy: CorruptDataPolicy) -> LedgerResult<()> {
        if let Some(balance) = apply_policy(read_balance(store), policy)? {
            self.balance = balance;
        }
        if let Some(history) = apply_policy(read_history(store), policy)? {
            self.transactions = history;
        }
        debug!("hydrated ledger: balance {}, {} transactions", self.balance, self.transactions.len());
        return Ok(());
    }

    /// Creates a ledger from the store, starting from the defaults.
    pub fn load(store: &impl KeyValueStore, policy: CorruptDataPolicy) -> LedgerResult<Ledger> {
        let mut ledger = Ledger::new();
        ledger.hydrate_with(store, policy)?;
        return Ok(ledger);
    }

    /// Reads only the transfer history, leaving the balance alone.
    pub fn load_history(store: &impl KeyValueStore, policy: CorruptDataPolicy) -> LedgerResult<Vec<Transaction>> {
        Ok(apply_policy(read_history(store), policy)?.unwrap_or_default())
    }

    /// Checks that a transfer of `amount` to `recipient` can go ahead.
    pub fn check_transfer(&self, recipient: &str, amount: Amount) -> LedgerResult<()> {
        if recipient.is_empty() {
            return Err(TransactionError::EmptyRecipient.into());
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(TransactionError::InvalidAmount(amount).into());
        }
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance { amount, balance: self.balance });
        }
        return Ok(());
    }

    pub fn transfer(&mut self, store: &mut impl KeyValueStore, recipient: &str, amount: Amount) -> LedgerResult<Transaction> {
        self.transfer_at(store, recipient, amount, Local::now())
    }

    /// Sends `amount` to `recipient`, then writes the new state to `store`.
    ///
    /// Nothing changes if the transfer is rejected. Memory is updated before
    /// the store, so a failed write leaves the two out of step until the next
    /// successful one.
    pub fn transfer_at(&mut self, store: &mut impl KeyValueStore, recipient: &str, amount: Amount, date: DateTime<Local>) -> LedgerResult<Transaction> {
        self.check_transfer(recipient, amount)?;
        let transaction = Transaction::at(date, recipient, amount)?;

        self.balance -= amount;
        self.transactions.push(transaction.clone());
        info!("sent {} to {}, balance now {}", format_amount(amount), recipient, self.balance);

        if let Err(err) = self.persist(store) {
            warn!("stored ledger is out of date: {}", err);
            return Err(err);
        }
        return Ok(transaction);
    }

    /// Writes balance and history as two independent store operations.
    pub fn persist(&self, store: &mut impl KeyValueStore) -> LedgerResult<()> {
        store.set_item(BALANCE_KEY, &format_amount(self.balance))?;
        let history = serde_json::to_string(&self.transactions)?;
        store.set_item(HISTORY_KEY, &history)?;
        debug!("persisted balance and {} transactions", self.transactions.len());
        return Ok(());
    }
}

fn read_balance(store: &impl KeyValueStore) -> LedgerResult<Option<Amount>> {
    let stored = match store.get_item(BALANCE_KEY)? {
        Some(stored) => stored,
        None => return Ok(None)
    };
    let balance: Amount = stored.trim().parse()
        .map_err(|_| corrupt(BALANCE_KEY, format!("'{}' is not a number", stored)))?;
    if !balance.is_finite() {
        return Err(corrupt(BALANCE_KEY, format!("'{}' is not a finite number", stored)));
    }
    return Ok(Some(balance));
}

fn read_history(store: &impl KeyValueStore) -> LedgerResult<Option<Vec<Transaction>>> {
    match store.get_item(HISTORY_KEY)? {
        Some(stored) => serde_json::from_str(&stored)
            .map(Some)
            .map_err(|err| corrupt(HISTORY_KEY, err.to_string())),
        None => Ok(None)
    }
}

fn corrupt(key: &str, reason: String) -> LedgerError {
    LedgerError::CorruptStore { key: key.to_owned(), reason }
}

fn apply_policy<T>(read: LedgerResult<Option<T>>, policy: CorruptDataPolicy) -> LedgerResult<Option<T>> {
    match (read, policy) {
        (Err(LedgerError::CorruptStore { key, reason }), CorruptDataPolicy::Reset) => {
            warn!("ignoring malformed '{}' in store ({}), using default", key, reason);
            Ok(None)
        },
        (read, _) => read
    }
}
