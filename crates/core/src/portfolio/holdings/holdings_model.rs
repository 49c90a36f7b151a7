use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};
use crate::securities::Security;

/// A position as served by the backend.
///
/// Every field past `id` may be absent: older records have no nested
/// security, and prices are only present once the backend has quoted them.
/// Nothing reads these fields directly for display; they go through
/// [`normalize_holding`](super::normalize_holding) first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<Decimal>,
    /// Flat price field some endpoints send instead of `security.currentPrice`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
}

/// Fully-populated holding with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHolding {
    pub id: String,
    pub security_id: Option<String>,
    pub symbol: String,
    pub name: String,
    pub shares: Decimal,
    pub average_cost: Decimal,
    /// Effective price; zero when the backend sent none.
    pub current_price: Decimal,
    pub has_price: bool,
}

/// Holding row for display, with derived values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    pub id: String,
    pub security_id: Option<String>,
    pub symbol: String,
    pub name: String,
    pub shares: Decimal,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    pub has_price: bool,

    // Derived values, never sent back to the server
    pub market_value: Decimal,
    pub book_value: Decimal,
    pub unrealized_gain: Decimal,
    /// Gain as a ratio of book value (0.2 = +20%).
    pub unrealized_gain_pct: Decimal,
    /// Share of total portfolio market value (ratio).
    pub weight: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub market_value: Decimal,
    pub book_value: Decimal,
    pub unrealized_gain: Decimal,
    pub unrealized_gain_pct: Decimal,
}

/// Derived holdings for one portfolio fetch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsSummary {
    pub holdings: Vec<HoldingView>,
    pub totals: PortfolioTotals,
    /// Set when any holding lacks a current price. Shown as a warning.
    pub missing_price_data: bool,
    pub missing_price_symbols: Vec<String>,
}

/// Payload for creating or updating a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HoldingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub shares: Decimal,
    pub average_cost: Decimal,
}

impl HoldingInput {
    pub fn validate(&self) -> Result<()> {
        let has_symbol = self
            .symbol
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if self.security_id.is_none() && !has_symbol {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if self.shares.is_sign_negative() {
            return Err(ValidationError::invalid_field("shares", "must not be negative").into());
        }
        if self.average_cost.is_sign_negative() {
            return Err(
                ValidationError::invalid_field("averageCost", "must not be negative").into(),
            );
        }
        Ok(())
    }
}
