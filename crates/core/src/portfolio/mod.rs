//! Portfolio views - derived holdings, sort ordering and allocation charts.

pub mod allocation;
pub mod holdings;
pub mod sort;

pub use allocation::*;
pub use holdings::*;
pub use sort::*;
