//! Holdings module - backend holding records and the values derived from them.

mod holdings_calculator;
mod holdings_model;

#[cfg(test)]
mod holdings_calculator_tests;

pub use holdings_calculator::{calculate_holdings, derive_holding, normalize_holding};
pub use holdings_model::{
    Holding, HoldingInput, HoldingView, HoldingsSummary, NormalizedHolding, PortfolioTotals,
};
