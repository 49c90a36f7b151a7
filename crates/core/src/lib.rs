//! Stockfolio Core - Domain entities, derived holdings and session state.
//!
//! This crate mirrors the records served by the portfolio backend and holds the
//! client-side logic computed over them: holding normalization, derived values,
//! sort ordering, allocation breakdowns and the authenticated session context.
//! It performs no I/O of its own; persistence goes through [`secrets::SecretStore`].

pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod portfolios;
pub mod secrets;
pub mod securities;
pub mod session;
pub mod transactions;
pub mod users;

// Re-export common types from the portfolio modules
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
