//! Stockfolio Client - talks to the portfolio backend.
//!
//! - [`HttpClient`]: bearer-token injection, timeout and error classification
//! - [`ApiClient`]: the typed endpoints, behind the [`PortfolioApi`] trait
//! - [`QueryCache`] / [`PortfolioQueries`]: cached reads and invalidating writes

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod queries;

pub use cache::{QueryCache, QueryKey, StaleTimes};
pub use client::{ApiClient, PortfolioApi};
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiError, ErrorKind, ErrorPayload, Result};
pub use http::{HttpClient, RequestAuth, REQUEST_ID_HEADER};
pub use queries::{PortfolioQueries, MUTATION_RETRIES};
