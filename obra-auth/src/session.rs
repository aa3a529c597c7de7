//! The one place that knows whether the client is logged in.
//!
//! State lives in memory behind a lock and is mirrored to a `TokenStorage`
//! on every transition, so a new process picks the session back up with
//! `SessionStore::restore`.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::models::User;
use crate::storage::{TokenStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use crate::token::{Claims, RefreshedToken, TokenPair};

#[derive(Debug, Default, Clone)]
struct SessionState {
    access: Option<String>,
    refresh: Option<String>,
    user: Option<User>,
}

pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    state: RwLock<SessionState>,
    expiry_skew: Duration,
}

impl SessionStore {
    /// Start empty without looking at what the storage already holds.
    pub fn new(storage: Arc<dyn TokenStorage>, expiry_skew: Duration) -> Self {
        Self {
            storage,
            state: RwLock::new(SessionState::default()),
            expiry_skew,
        }
    }

    /// Rebuild the session from storage.
    ///
    /// A cached user that no longer parses is dropped rather than failing
    /// the whole restore; it is fetched again on the next `me()`.
    pub fn restore(storage: Arc<dyn TokenStorage>, expiry_skew: Duration) -> SessionResult<Self> {
        let access = storage.get(ACCESS_TOKEN_KEY)?;
        let refresh = storage.get(REFRESH_TOKEN_KEY)?;
        let user = match storage.get(USER_DATA_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable cached user");
                    None
                }
            },
            None => None,
        };

        debug!(has_access = access.is_some(), has_user = user.is_some(), "session restored");
        Ok(Self {
            storage,
            state: RwLock::new(SessionState { access, refresh, user }),
            expiry_skew,
        })
    }

    pub fn acquire_on_login(&self, tokens: TokenPair, user: Option<User>) -> SessionResult<()> {
        self.storage.set(ACCESS_TOKEN_KEY, &tokens.access)?;
        self.storage.set(REFRESH_TOKEN_KEY, &tokens.refresh)?;
        match &user {
            Some(user) => self.storage.set(USER_DATA_KEY, &serde_json::to_string(user)?)?,
            None => self.storage.remove(USER_DATA_KEY)?,
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = SessionState {
            access: Some(tokens.access),
            refresh: Some(tokens.refresh),
            user,
        };
        info!(email = state.user.as_ref().map(|u| u.email.as_str()), "session acquired");
        Ok(())
    }

    /// Forget everything. Memory is cleared even if storage fails, so the
    /// process never keeps using a token it meant to drop.
    pub fn clear_on_logout(&self) -> SessionResult<()> {
        {
            let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
            *state = SessionState::default();
        }
        self.storage.remove(ACCESS_TOKEN_KEY)?;
        self.storage.remove(REFRESH_TOKEN_KEY)?;
        self.storage.remove(USER_DATA_KEY)?;
        info!("session cleared");
        Ok(())
    }

    pub fn refresh_on_expiry(&self, refreshed: RefreshedToken) -> SessionResult<()> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        self.storage.set(ACCESS_TOKEN_KEY, &refreshed.access)?;
        if let Some(refresh) = &refreshed.refresh {
            self.storage.set(REFRESH_TOKEN_KEY, refresh)?;
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.access = Some(refreshed.access);
        if let Some(refresh) = refreshed.refresh {
            state.refresh = Some(refresh);
        }
        debug!("access token refreshed");
        Ok(())
    }

    pub fn set_user(&self, user: User) -> SessionResult<()> {
        self.storage.set(USER_DATA_KEY, &serde_json::to_string(&user)?)?;
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.user = Some(user);
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh
    }

    pub fn user(&self) -> Option<User> {
        self.read().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access.is_some()
    }

    pub fn expiry_skew(&self) -> Duration {
        self.expiry_skew
    }

    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        let access = self.access_token()?;
        Claims::decode_unverified(&access).ok()?.expires_at()
    }

    /// True when the access token expires within the skew window and a
    /// refresh token is available to renew it. Opaque tokens never report
    /// as expiring.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        let state = self.read();
        let (Some(access), Some(_)) = (state.access.as_deref(), state.refresh.as_deref()) else {
            return false;
        };
        match Claims::decode_unverified(access) {
            Ok(claims) => claims.is_expired(now, self.expiry_skew),
            Err(_) => false,
        }
    }

    fn read(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("authenticated", &state.access.is_some())
            .field("user", &state.user.as_ref().map(|u| u.email.clone()))
            .field("expiry_skew", &self.expiry_skew)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryTokenStorage;
    use crate::token::fake_jwt;

    fn admin() -> User {
        User {
            id: 1,
            email: "admin@obra.pe".into(),
            first_name: None,
            last_name: None,
            is_staff: true,
            is_superuser: false,
        }
    }

    fn pair(exp: i64) -> TokenPair {
        TokenPair {
            access: fake_jwt(&json!({"token_type": "access", "exp": exp, "user_id": 1})),
            refresh: fake_jwt(&json!({"token_type": "refresh", "exp": exp + 86_400, "user_id": 1})),
        }
    }

    #[test]
    fn login_is_persisted_and_restored() {
        let storage: Arc<dyn TokenStorage> = Arc::new(MemoryTokenStorage::new());
        let store = SessionStore::new(storage.clone(), Duration::from_secs(30));
        assert!(!store.is_authenticated());

        let tokens = pair(2_000_000_000);
        store.acquire_on_login(tokens.clone(), Some(admin())).unwrap();
        assert_eq!(store.access_token(), Some(tokens.access.clone()));

        let again = SessionStore::restore(storage, Duration::from_secs(30)).unwrap();
        assert!(again.is_authenticated());
        assert_eq!(again.refresh_token(), Some(tokens.refresh));
        assert_eq!(again.user(), Some(admin()));
    }

    #[test]
    fn logout_clears_memory_and_storage() {
        let storage: Arc<dyn TokenStorage> = Arc::new(MemoryTokenStorage::new());
        let store = SessionStore::new(storage.clone(), Duration::from_secs(30));
        store.acquire_on_login(pair(2_000_000_000), Some(admin())).unwrap();

        store.clear_on_logout().unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.user(), None);
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_DATA_KEY).unwrap(), None);
    }

    #[test]
    fn needs_refresh_inside_the_skew_window() {
        let store = SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30));
        store.acquire_on_login(pair(1_000), None).unwrap();

        let early = Utc.timestamp_opt(900, 0).unwrap();
        let close = Utc.timestamp_opt(980, 0).unwrap();
        assert!(!store.needs_refresh(early));
        assert!(store.needs_refresh(close));
        assert_eq!(store.access_expires_at(), Utc.timestamp_opt(1_000, 0).single());
    }

    #[test]
    fn refresh_keeps_refresh_token_unless_rotated() {
        let store = SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30));
        let tokens = pair(1_000);
        store.acquire_on_login(tokens.clone(), None).unwrap();

        store
            .refresh_on_expiry(RefreshedToken {
                access: "new-access".into(),
                refresh: None,
            })
            .unwrap();
        assert_eq!(store.access_token().as_deref(), Some("new-access"));
        assert_eq!(store.refresh_token(), Some(tokens.refresh));
        assert!(!store.needs_refresh(Utc::now()));
    }

    #[test]
    fn refresh_without_session_is_refused() {
        let store = SessionStore::new(Arc::new(MemoryTokenStorage::new()), Duration::from_secs(30));
        let err = store
            .refresh_on_expiry(RefreshedToken {
                access: "x".into(),
                refresh: None,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::NotAuthenticated));
    }

    #[test]
    fn unreadable_cached_user_is_dropped() {
        let storage: Arc<dyn TokenStorage> = Arc::new(MemoryTokenStorage::new());
        storage.set(ACCESS_TOKEN_KEY, "opaque").unwrap();
        storage.set(USER_DATA_KEY, "{broken").unwrap();
        let store = SessionStore::restore(storage, Duration::from_secs(30)).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.user(), None);
        assert!(!store.needs_refresh(Utc::now()));
    }
}
