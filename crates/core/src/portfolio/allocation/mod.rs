//! Allocation breakdown used by the dashboard chart.

mod allocation_calculator;
mod allocation_model;

pub use allocation_calculator::allocation_by_symbol;
pub use allocation_model::AllocationSlice;
