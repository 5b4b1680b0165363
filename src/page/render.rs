use crate::core::{Amount, Ledger, Transaction};
use crate::core::transaction::format_amount;
use crate::page::document::{Document, DocumentResult, BALANCE_ID, HISTORY_ID};

// From here on a browser prints fixed-point balances in exponent form.
const FIXED_POINT_LIMIT: Amount = 1e21;

/// Balance as shown to the user: always two decimals.
///
/// An exact tie between two cents goes to the one further from zero,
/// so `0.125` shows as `0.13`. Everything else is rounded to nearest.
pub fn format_balance(balance: Amount) -> String {
    if !balance.is_finite() || balance.abs() >= FIXED_POINT_LIMIT {
        return format_amount(balance);
    }
    if balance == 0.0 {
        return "0.00".to_owned();
    }
    match half_cents(balance.abs()) {
        Some(half) => {
            let cents = (half + 1) / 2;
            let sign = if balance < 0.0 { "-" } else { "" };
            format!("{}{}.{:02}", sign, cents / 100, cents % 100)
        },
        None => format!("{:.2}", balance)
    }
}

/// `200 * value` when that is an odd integer, i.e. when `value` lies exactly
/// halfway between two cents.
fn half_cents(value: Amount) -> Option<u64> {
    let bits = value.to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    };

    // whole multiples of a power of two are never a half cent away
    if exponent >= 0 || exponent <= -64 {
        return None;
    }
    let shift = (-exponent) as u32;
    let scaled = mantissa * 200;
    if scaled & ((1u64 << shift) - 1) != 0 {
        return None;
    }
    let half = scaled >> shift;
    if half % 2 == 1 {
        return Some(half);
    }
    return None;
}

/// Shows the balance and rebuilds the history list from scratch.
pub fn render(ledger: &Ledger, document: &mut impl Document) -> DocumentResult<()> {
    document.set_text(BALANCE_ID, &format_balance(ledger.balance()))?;
    render_history(ledger.transactions(), document)
}

pub fn render_history(transactions: &[Transaction], document: &mut impl Document) -> DocumentResult<()> {
    document.clear_children(HISTORY_ID)?;
    for transaction in transactions {
        document.append_list_item(HISTORY_ID, &transaction.to_string())?;
    }
    return Ok(());
}
