//! Money primitives: minor units, the two account kinds, formatting and
//! boundary parsing.
//!
//! All balance arithmetic is done in integer cents. Floating point only
//! appears at the input boundary ([`parse_dollars`], [`round_to_cents`]) and
//! in cosmetic scaling ([`scale_cents`]), and is rounded away immediately.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Smallest currency unit (cents).
pub type Cents = i64;

/// One of the two accounts a player owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    #[serde(alias = "chequing")]
    Checking,
    Savings,
}

impl Account {
    pub fn label(self) -> &'static str {
        match self {
            Account::Checking => "checking",
            Account::Savings => "savings",
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Render cents as `$12.34` (or `-$12.34`).
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Round a dollar amount to the nearest cent. `None` for non-finite input
/// or values outside the representable range.
pub fn round_to_cents(dollars: f64) -> Option<Cents> {
    if !dollars.is_finite() {
        return None;
    }
    let cents = (dollars * 100.0).round();
    if cents.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(cents as Cents)
}

/// Parse user-entered dollars (`"5"`, `"5.00"`, `"$5.25"`) into cents.
/// Fractions of a cent are rounded; zero and negative amounts are rejected.
pub fn parse_dollars(input: &str) -> Result<Cents, LedgerError> {
    let trimmed = input.trim().trim_start_matches('$').replace(',', "");
    let dollars: f64 = trimmed
        .parse()
        .map_err(|_| LedgerError::UnparsableAmount(input.to_string()))?;
    let cents = round_to_cents(dollars).ok_or_else(|| LedgerError::UnparsableAmount(input.to_string()))?;
    if cents <= 0 {
        return Err(LedgerError::InvalidAmount(cents));
    }
    Ok(cents)
}

/// Scale an amount by a factor and round back to whole cents.
pub fn scale_cents(amount: Cents, factor: f64) -> Cents {
    (amount as f64 * factor).round() as Cents
}
