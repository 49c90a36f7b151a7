//! Tests for the auth session context.

#[cfg(test)]
mod tests {
    use crate::constants::{DASHBOARD_ROUTE, LOGIN_ROUTE};
    use crate::secrets::{MemorySecretStore, SecretStore};
    use crate::session::{
        AuthSession, Navigator, StaticNavigator, TOKEN_SECRET_KEY, USER_SECRET_KEY,
    };
    use crate::users::User;
    use std::sync::Arc;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: None,
            last_name: None,
        }
    }

    fn session() -> (Arc<MemorySecretStore>, AuthSession) {
        let store = Arc::new(MemorySecretStore::new());
        let session = AuthSession::new(store.clone());
        (store, session)
    }

    #[test]
    fn test_sign_in_persists_token_and_user() {
        let (store, session) = session();
        session.sign_in("tok-1", user()).unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok-1"));
        assert_eq!(session.current_user(), Some(user()));
        assert_eq!(
            store.get_secret(TOKEN_SECRET_KEY).unwrap().as_deref(),
            Some("tok-1")
        );
        let persisted: User =
            serde_json::from_str(&store.get_secret(USER_SECRET_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, user());
    }

    #[test]
    fn test_hydrate_restores_persisted_session() {
        let (store, first) = session();
        first.sign_in("tok-2", user()).unwrap();

        let restored = AuthSession::new(store);
        assert!(!restored.is_authenticated());
        assert!(restored.hydrate().unwrap());
        assert_eq!(restored.token().as_deref(), Some("tok-2"));
        assert_eq!(restored.current_user().map(|u| u.id), Some("u1".to_string()));
    }

    #[test]
    fn test_hydrate_without_token_is_signed_out() {
        let (_store, session) = session();
        assert!(!session.hydrate().unwrap());
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_hydrate_discards_corrupt_user_record() {
        let (store, session) = session();
        store.set_secret(TOKEN_SECRET_KEY, "tok-3").unwrap();
        store.set_secret(USER_SECRET_KEY, "{not json").unwrap();

        assert!(session.hydrate().unwrap());
        assert_eq!(session.token().as_deref(), Some("tok-3"));
        assert!(session.current_user().is_none());
        assert!(store.get_secret(USER_SECRET_KEY).unwrap().is_none());
    }

    #[test]
    fn test_sign_out_clears_everything() {
        let (store, session) = session();
        session.sign_in("tok-4", user()).unwrap();
        session.sign_out().unwrap();

        assert!(!session.is_authenticated());
        assert!(store.get_secret(TOKEN_SECRET_KEY).unwrap().is_none());
        assert!(store.get_secret(USER_SECRET_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unauthorized_clears_session_and_redirects_once() {
        let (store, session) = session();
        let navigator = StaticNavigator::new(DASHBOARD_ROUTE);
        session.sign_in("tok-5", user()).unwrap();

        assert!(session.handle_unauthorized(&navigator).unwrap());
        assert!(!session.is_authenticated());
        assert!(store.get_secret(TOKEN_SECRET_KEY).unwrap().is_none());
        assert!(store.get_secret(USER_SECRET_KEY).unwrap().is_none());
        assert_eq!(navigator.current_route(), LOGIN_ROUTE);

        // A second 401 from a request that was already in flight
        assert!(!session.handle_unauthorized(&navigator).unwrap());
        assert_eq!(navigator.history(), vec![LOGIN_ROUTE.to_string()]);
    }

    #[test]
    fn test_unauthorized_on_login_route_does_not_redirect() {
        let (_store, session) = session();
        let navigator = StaticNavigator::new(LOGIN_ROUTE);
        session.sign_in("tok-6", user()).unwrap();

        assert!(!session.handle_unauthorized(&navigator).unwrap());
        assert!(navigator.history().is_empty());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_redirect_rearms_after_sign_in() {
        let (_store, session) = session();
        let navigator = StaticNavigator::new(DASHBOARD_ROUTE);

        session.sign_in("tok-7", user()).unwrap();
        assert!(session.handle_unauthorized(&navigator).unwrap());

        navigator.navigate(DASHBOARD_ROUTE);
        session.sign_in("tok-8", user()).unwrap();
        assert!(session.handle_unauthorized(&navigator).unwrap());

        assert_eq!(
            navigator.history(),
            vec![
                LOGIN_ROUTE.to_string(),
                DASHBOARD_ROUTE.to_string(),
                LOGIN_ROUTE.to_string()
            ]
        );
    }
}
