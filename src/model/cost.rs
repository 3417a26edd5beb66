//! Cost type for receipt amounts entered as free-form text.
//!
//! This module provides the `Cost` type which keeps the amount exactly as entered and parses it
//! into a `Decimal` only when a numeric value is needed, treating malformed content as zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A receipt cost.
///
/// The raw string is preserved for display and serialization. Parsing from user input keeps only
/// digits and a single decimal point and truncates to two decimal places; anything else is
/// rejected. Stored data is accepted verbatim on deserialization, and `value` falls back to zero
/// when that content does not parse, so one bad entry never poisons a session total.
///
/// # Examples
///
/// Input is reduced to digits and a decimal point:
/// ```
/// # use field_receipts::model::Cost;
/// # use std::str::FromStr;
/// let cost = Cost::from_str("$12.345").unwrap();
/// assert_eq!(cost.to_string(), "12.34");
/// ```
///
/// Malformed stored content counts as zero:
/// ```
/// # use field_receipts::model::Cost;
/// let cost: Cost = serde_json::from_str("\"abc\"").unwrap();
/// assert!(cost.value().is_zero());
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cost(String);

impl Cost {
    /// Returns the numeric value, or zero when the stored string is not a valid decimal.
    pub fn value(&self) -> Decimal {
        Decimal::from_str(self.0.trim()).unwrap_or(Decimal::ZERO)
    }

    /// The cost exactly as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cost {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let parts: Vec<&str> = cleaned.split('.').collect();
        let normalized = match parts.as_slice() {
            [whole] => whole.to_string(),
            [whole, fraction] => {
                let whole = if whole.is_empty() { "0" } else { whole };
                let fraction = if fraction.len() > 2 {
                    &fraction[..2]
                } else {
                    fraction
                };
                if fraction.is_empty() {
                    whole.to_string()
                } else {
                    format!("{whole}.{fraction}")
                }
            }
            _ => anyhow::bail!("A cost may contain only one decimal point, got '{s}'"),
        };
        if !normalized.contains(|c: char| c.is_ascii_digit()) {
            anyhow::bail!("A cost requires at least one digit, got '{s}'");
        }
        Ok(Cost(normalized))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
