use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A buy or sell event belonging to a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_id: Option<String>,
    pub transaction_type: TransactionType,
    pub shares: Decimal,
    pub price_per_share: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Decimal>,
    pub transaction_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload for creating or updating a transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub transaction_type: TransactionType,
    pub shares: Decimal,
    pub price_per_share: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Decimal>,
    pub transaction_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionInput {
    pub fn validate(&self) -> Result<()> {
        if self.shares <= Decimal::ZERO {
            return Err(ValidationError::invalid_field("shares", "must be greater than 0").into());
        }
        if self.price_per_share.is_sign_negative() {
            return Err(
                ValidationError::invalid_field("pricePerShare", "must not be negative").into(),
            );
        }
        if matches!(self.fees, Some(fees) if fees.is_sign_negative()) {
            return Err(ValidationError::invalid_field("fees", "must not be negative").into());
        }
        Ok(())
    }
}
