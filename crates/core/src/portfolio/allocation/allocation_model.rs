use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One slice of the allocation chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub symbol: String,
    pub name: String,
    /// Market value of all holdings sharing the symbol
    pub value: Decimal,
    /// Percentage of total portfolio (0-100)
    pub percentage: Decimal,
}
