//! Users module - the signed-in user and authentication payloads.

mod users_model;

#[cfg(test)]
mod users_model_tests;

pub use users_model::{AuthResponse, LoginRequest, RegisterRequest, User};
