//! Transactions module - buy and sell events recorded against a holding.

mod transactions_model;

#[cfg(test)]
mod transactions_model_tests;

pub use transactions_model::{Transaction, TransactionInput, TransactionType};
