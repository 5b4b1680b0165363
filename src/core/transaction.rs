use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize, Serializer};

use crate::core::error::TransactionError;

pub type Amount = f64;

/// Timestamp layout used for new transactions, e.g. `3/5/2024, 2:07:09 PM`.
pub const DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

// Largest integer an f64 holds exactly.
const MAX_EXACT_INTEGER: Amount = 9_007_199_254_740_991.0;

/// Formats an amount the way it is shown in history lines and stored
/// as the balance: shortest representation, no trailing `.0`.
///
/// Very small and very large magnitudes switch to exponent form the way a
/// browser prints numbers: `1e-7`, `1.5e+21`.
pub fn format_amount(amount: Amount) -> String {
    if amount == 0.0 {
        return "0".to_owned();
    }
    if amount.is_nan() {
        return "NaN".to_owned();
    }
    if amount.is_infinite() {
        return if amount > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if amount < 0.0 {
        return format!("-{}", format_amount(-amount));
    }

    // `{:e}` yields the shortest digits that read back to the same value
    let scientific = format!("{:e}", amount);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return amount.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return amount.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let len = digits.len() as i32;
    // position of the decimal point relative to the first digit
    let point = exponent + 1;

    if len <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{}.{}", whole, fraction)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exponent.abs())
        }
    }
}

fn serialize_amount<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.fract() == 0.0 && amount.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

/// A single transfer sent from the balance. Never modified after creation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(try_from = "StoredTransaction")]
pub struct Transaction {
    date: String,
    recipient: String,
    #[serde(serialize_with = "serialize_amount")]
    amount: Amount,
}

/// Shape of a transaction as found in the store, before validation.
#[derive(Deserialize)]
struct StoredTransaction {
    date: String,
    recipient: String,
    amount: Amount,
}

impl TryFrom<StoredTransaction> for Transaction {
    type Error = TransactionError;

    fn try_from(stored: StoredTransaction) -> Result<Self, Self::Error> {
        Transaction::with_date(stored.date, &stored.recipient, stored.amount)
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: Sent ${} to {}", self.date, format_amount(self.amount), self.recipient)
    }
}

impl Transaction {
    /// Creates a transaction stamped with the current local time.
    pub fn new(recipient: &str, amount: Amount) -> Result<Transaction, TransactionError> {
        Transaction::at(Local::now(), recipient, amount)
    }

    pub fn at(date: DateTime<Local>, recipient: &str, amount: Amount) -> Result<Transaction, TransactionError> {
        Transaction::with_date(date.format(DATE_FORMAT).to_string(), recipient, amount)
    }

    fn with_date(date: String, recipient: &str, amount: Amount) -> Result<Transaction, TransactionError> {
        if recipient.is_empty() {
            return Err(TransactionError::EmptyRecipient);
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(TransactionError::InvalidAmount(amount));
        }
        return Ok(Transaction { date, recipient: recipient.to_owned(), amount });
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}
