//! Session module - the authenticated session context and route navigation.

mod navigator;
mod session_service;

#[cfg(test)]
mod session_service_tests;

pub use navigator::{Navigator, StaticNavigator};
pub use session_service::{AuthSession, SessionState, TOKEN_SECRET_KEY, USER_SECRET_KEY};
