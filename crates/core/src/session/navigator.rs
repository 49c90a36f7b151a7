use std::sync::Mutex;

/// Route control for the presentation layer.
///
/// The session uses it to send the user back to the login route when the
/// backend rejects the token.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn navigate(&self, route: &str);
}

/// Navigator that only records the current route and every navigation.
#[derive(Debug)]
pub struct StaticNavigator {
    route: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl StaticNavigator {
    pub fn new(initial_route: &str) -> Self {
        Self {
            route: Mutex::new(initial_route.to_string()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Routes navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for StaticNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn navigate(&self, route: &str) {
        *self
            .route
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = route.to_string();
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route.to_string());
    }
}
