use log::{debug, info};
use std::sync::{Arc, PoisonError, RwLock};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Holds the opaque session token. Set on login, read on every protected
/// navigation, cleared on logout.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: String);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    // A poisoned lock still holds a valid Option, so keep using it
    fn get(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, token: String) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        debug!("Clearing session token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    // Send the user to `to`, then back to `from` once logged in
    Redirect { to: &'static str, from: String },
}

pub struct AuthGate {
    store: Arc<dyn SessionStore>,
}

impl AuthGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn check(&self, location: &str) -> Access {
        match self.store.get() {
            Some(token) if !token.is_empty() => Access::Granted,
            _ => {
                info!("Unauthenticated access to {}, redirecting to {}", location, LOGIN_PATH);
                Access::Redirect {
                    to: LOGIN_PATH,
                    from: location.to_string(),
                }
            }
        }
    }

    // Where to go after a successful login
    pub fn after_login(from: Option<&str>) -> String {
        match from {
            Some(path) if !path.is_empty() && path != LOGIN_PATH => path.to_string(),
            _ => HOME_PATH.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_round_trips_and_clears() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get(), None);
        store.set("abc".into());
        assert_eq!(store.get().as_deref(), Some("abc"));
        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn gate_redirects_and_remembers_location() {
        let store = Arc::new(MemorySessionStore::new());
        let gate = AuthGate::new(store.clone());
        assert_eq!(
            gate.check("/candidates/manage"),
            Access::Redirect {
                to: "/login",
                from: "/candidates/manage".to_string()
            }
        );

        store.set("token-1".into());
        assert_eq!(gate.check("/candidates/manage"), Access::Granted);

        store.clear();
        assert!(matches!(gate.check("/voters"), Access::Redirect { .. }));
    }

    #[test]
    fn empty_token_is_not_a_session() {
        let gate = AuthGate::new(Arc::new(MemorySessionStore::with_token("")));
        assert!(matches!(gate.check("/"), Access::Redirect { .. }));
    }

    #[test]
    fn after_login_returns_to_origin() {
        assert_eq!(AuthGate::after_login(Some("/voters")), "/voters");
        assert_eq!(AuthGate::after_login(Some("/login")), "/");
        assert_eq!(AuthGate::after_login(None), "/");
    }

    #[test]
    fn poisoned_store_still_sets_and_clears() {
        let store = Arc::new(MemorySessionStore::with_token("old"));
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.token.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(store.token.is_poisoned());

        store.set("new".into());
        assert_eq!(store.get().as_deref(), Some("new"));
        store.clear();
        assert_eq!(store.get(), None);
    }
}
