//! Securities module - tradable instruments referenced by holdings.

mod securities_model;

pub use securities_model::{Security, SecurityInput};
