use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::navigator::Navigator;
use crate::constants::LOGIN_ROUTE;
use crate::errors::Result;
use crate::secrets::SecretStore;
use crate::users::User;

/// Secret name holding the bearer token.
pub const TOKEN_SECRET_KEY: &str = "auth_token";

/// Secret name holding the JSON-encoded user record.
pub const USER_SECRET_KEY: &str = "auth_user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub token: String,
    pub user: Option<User>,
}

/// Authenticated session context.
///
/// Owns the bearer token and the signed-in user. State is hydrated from the
/// secret store on start and cleared on sign-out or when the backend answers
/// 401. Pass it by reference (`Arc<AuthSession>`) to whatever needs the token.
pub struct AuthSession {
    store: Arc<dyn SecretStore>,
    state: RwLock<Option<SessionState>>,
    /// Set once a forced logout has redirected; reset by the next sign-in.
    redirect_issued: AtomicBool,
}

impl AuthSession {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self {
            store,
            state: RwLock::new(None),
            redirect_issued: AtomicBool::new(false),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Option<SessionState>> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("[Session] State lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Option<SessionState>> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("[Session] State lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Loads the persisted token and user. Returns whether a session was restored.
    ///
    /// A user record that no longer parses is discarded; the token alone still
    /// restores the session.
    pub fn hydrate(&self) -> Result<bool> {
        let token = match self.store.get_secret(TOKEN_SECRET_KEY)? {
            Some(token) if !token.trim().is_empty() => token,
            _ => {
                debug!("[Session] No persisted token");
                *self.write_state() = None;
                return Ok(false);
            }
        };

        let user = match self.store.get_secret(USER_SECRET_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("[Session] Discarding unreadable persisted user: {}", e);
                    self.store.delete_secret(USER_SECRET_KEY)?;
                    None
                }
            },
            None => None,
        };

        info!(
            "[Session] Restored session for {}",
            user.as_ref().map(|u| u.username.as_str()).unwrap_or("unknown user")
        );
        *self.write_state() = Some(SessionState { token, user });
        self.redirect_issued.store(false, Ordering::SeqCst);
        Ok(true)
    }

    /// Persists and activates a new session.
    pub fn sign_in(&self, token: &str, user: User) -> Result<()> {
        self.store.set_secret(TOKEN_SECRET_KEY, token)?;
        self.store
            .set_secret(USER_SECRET_KEY, &serde_json::to_string(&user)?)?;

        info!("[Session] Signed in as {}", user.username);
        *self.write_state() = Some(SessionState {
            token: token.to_string(),
            user: Some(user),
        });
        self.redirect_issued.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Clears the persisted token and user and the in-memory session.
    pub fn sign_out(&self) -> Result<()> {
        *self.write_state() = None;
        self.store.delete_secret(TOKEN_SECRET_KEY)?;
        self.store.delete_secret(USER_SECRET_KEY)?;
        info!("[Session] Signed out");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.read_state().as_ref().map(|s| s.token.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.read_state().as_ref().and_then(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_some()
    }

    /// Forced logout after the backend rejected the token.
    ///
    /// Clears the session, then sends the navigator to the login route unless
    /// it is already there or a previous 401 already redirected. Returns
    /// whether a redirect was issued.
    pub fn handle_unauthorized(&self, navigator: &dyn Navigator) -> Result<bool> {
        warn!("[Session] Backend rejected the session token, signing out");
        self.sign_out()?;

        if navigator.current_route() == LOGIN_ROUTE {
            debug!("[Session] Already on login route, not redirecting");
            return Ok(false);
        }
        if self.redirect_issued.swap(true, Ordering::SeqCst) {
            debug!("[Session] Redirect to login already issued");
            return Ok(false);
        }

        navigator.navigate(LOGIN_ROUTE);
        Ok(true)
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
