use std::sync::Mutex;

use stockfolio_core::constants::LOGIN_ROUTE;
use stockfolio_core::session::Navigator;

/// Navigator for the terminal front end.
///
/// There is no router to drive; a move to the login route is reported so the
/// user knows the saved session is gone and credentials are needed.
#[derive(Debug)]
pub struct TerminalNavigator {
    route: Mutex<String>,
}

impl TerminalNavigator {
    pub fn new(initial_route: &str) -> Self {
        Self {
            route: Mutex::new(initial_route.to_string()),
        }
    }

    pub fn on_login_route(&self) -> bool {
        self.current_route() == LOGIN_ROUTE
    }
}

impl Navigator for TerminalNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn navigate(&self, route: &str) {
        if route == LOGIN_ROUTE {
            tracing::warn!("Session expired or was rejected; sign in again with SF_USERNAME and SF_PASSWORD");
        } else {
            tracing::debug!("Navigating to {}", route);
        }
        *self
            .route
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = route.to_string();
    }
}
