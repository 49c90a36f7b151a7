//! Portfolios module - portfolio records and write payloads.

mod portfolios_model;

#[cfg(test)]
mod portfolios_model_tests;

pub use portfolios_model::{Portfolio, PortfolioInput};
