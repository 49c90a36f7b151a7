//! Sort contract for the holdings table.

mod sort_model;


pub use sort_model::{sort_holdings, SortDirection, SortField, SortState};
