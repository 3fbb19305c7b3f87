use crate::gateways::{GatewayError, GatewayResult};
use crate::models::Profile;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct Entry {
    token: String,
    profile: Profile,
    touched: Instant,
}

/// Bearer token and cached profile of the operator signed in to this console.
///
/// With a ttl the session is dropped after that long without any access.
pub struct SessionStore {
    entry: Mutex<Option<Entry>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entry: Mutex::new(None),
            ttl,
        }
    }

    pub fn set_session(&self, token: String, profile: Profile) {
        *self.guard() = Some(Entry {
            token,
            profile,
            touched: Instant::now(),
        });
    }

    pub fn token(&self) -> GatewayResult<String> {
        self.read(|entry| entry.token.clone())
    }

    pub fn profile(&self) -> GatewayResult<Profile> {
        self.read(|entry| entry.profile.clone())
    }

    pub fn clear(&self) {
        self.guard().take();
    }

    fn read<T>(&self, f: impl FnOnce(&Entry) -> T) -> GatewayResult<T> {
        let mut guard = self.guard();
        let expired = match (guard.as_ref(), self.ttl) {
            (Some(entry), Some(ttl)) => entry.touched.elapsed() >= ttl,
            _ => false,
        };
        if expired {
            tracing::debug!("Session expired after {:?} of inactivity", self.ttl);
            guard.take();
        }
        let entry = guard.as_mut().ok_or(GatewayError::Unauthenticated)?;
        entry.touched = Instant::now();
        Ok(f(entry))
    }

    fn guard(&self) -> MutexGuard<'_, Option<Entry>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: "0".into(),
            username: "admin".into(),
            name: "Admin User".into(),
            email: None,
            authority: Some("TENANT_ADMIN".into()),
        }
    }

    #[test]
    fn token_requires_session() {
        let store = SessionStore::new(None);
        assert!(matches!(store.token(), Err(GatewayError::Unauthenticated)));

        store.set_session("jwt".into(), profile());
        assert_eq!(store.token().unwrap(), "jwt");
        assert_eq!(store.profile().unwrap().username, "admin");

        store.clear();
        assert!(matches!(store.token(), Err(GatewayError::Unauthenticated)));
        assert!(matches!(store.profile(), Err(GatewayError::Unauthenticated)));
    }

    #[test]
    fn idle_session_expires() {
        let store = SessionStore::new(Some(Duration::from_millis(20)));
        store.set_session("jwt".into(), profile());
        assert!(store.token().is_ok());
        std::thread::sleep(Duration::from_millis(40));
        assert!(matches!(store.token(), Err(GatewayError::Unauthenticated)));
    }
}
