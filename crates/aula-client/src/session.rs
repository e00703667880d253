//! Session context and lifecycle state machine.
//!
//! The context owns the token pair and the cached profile. It is shared by
//! every clone of [`crate::AulaClient`] and is the only writer of the session
//! keys in the store.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use aula_api_models::{AccessGrant, TokenPair, UserProfile};
use tracing::{info, warn};

use crate::store::{
    ACCESS_TOKEN_KEY, MemoryStore, REFRESH_TOKEN_KEY, SESSION_KEYS, SessionStore, StoreError,
    USER_KEY,
};

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No usable session.
    #[default]
    Unauthenticated,
    /// Logged in with a usable account.
    Authenticated,
    /// Logged in, but the account must change its password first.
    MustChangePassword,
}

/// Input driving [`SessionState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A profile was fetched after login, restore or update.
    ProfileLoaded {
        /// Value of `debe_cambiar_password` in the profile.
        must_change_password: bool,
    },
    /// The password was changed successfully.
    PasswordChanged,
    /// The user logged out.
    LoggedOut,
    /// The session ended because authentication could not be recovered.
    Expired,
}

impl SessionState {
    /// Next state after `event`.
    #[must_use]
    pub const fn transition(self, event: SessionEvent) -> Self {
        match (self, event) {
            (_, SessionEvent::LoggedOut | SessionEvent::Expired) => Self::Unauthenticated,
            (
                _,
                SessionEvent::ProfileLoaded {
                    must_change_password: true,
                },
            ) => Self::MustChangePassword,
            (_, SessionEvent::ProfileLoaded { .. })
            | (Self::MustChangePassword, SessionEvent::PasswordChanged) => Self::Authenticated,
            (state, SessionEvent::PasswordChanged) => state,
        }
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }

    /// Log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::MustChangePassword => "must_change_password",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Shared handle to the session store and lifecycle state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionContext")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl SessionContext {
    /// Context over the given store, starting unauthenticated.
    #[must_use]
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Context over a store the caller keeps a handle to.
    #[must_use]
    pub fn from_shared(store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                state: RwLock::new(SessionState::Unauthenticated),
            }),
        }
    }

    /// Context over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    pub fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.inner.store.get(ACCESS_TOKEN_KEY)
    }

    /// Stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    pub fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.inner.store.get(REFRESH_TOKEN_KEY)
    }

    /// Cached profile snapshot. Unreadable or corrupt entries yield `None`.
    #[must_use]
    pub fn cached_user(&self) -> Option<UserProfile> {
        let raw = match self.inner.store.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "failed to read cached user");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|err| warn!(error = %err, "ignoring corrupt cached user"))
            .ok()
    }

    pub(crate) fn store_tokens(&self, pair: &TokenPair) -> Result<(), StoreError> {
        self.inner.store.set_many(&[
            (ACCESS_TOKEN_KEY, pair.access.clone()),
            (REFRESH_TOKEN_KEY, pair.refresh.clone()),
        ])
    }

    pub(crate) fn store_refreshed(&self, grant: &AccessGrant) -> Result<(), StoreError> {
        let mut entries = vec![(ACCESS_TOKEN_KEY, grant.access.clone())];
        if let Some(refresh) = &grant.refresh {
            entries.push((REFRESH_TOKEN_KEY, refresh.clone()));
        }
        self.inner.store.set_many(&entries)
    }

    /// Cache `profile` and apply its state. Skipped once the tokens are gone,
    /// so a fetch that outlives a logout does not revive the session.
    pub(crate) fn cache_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        if self.access_token()?.is_none() {
            warn!(
                username = %profile.username,
                "session ended before the profile arrived; not caching"
            );
            return Ok(());
        }
        let encoded =
            serde_json::to_string(profile).map_err(|source| StoreError::Encode { source })?;
        self.inner.store.set(USER_KEY, encoded)?;
        self.apply(SessionEvent::ProfileLoaded {
            must_change_password: profile.debe_cambiar_password,
        });
        Ok(())
    }

    pub(crate) fn mark_password_changed(&self) -> Result<(), StoreError> {
        if let Some(mut profile) = self.cached_user() {
            profile.debe_cambiar_password = false;
            let encoded =
                serde_json::to_string(&profile).map_err(|source| StoreError::Encode { source })?;
            self.inner.store.set(USER_KEY, encoded)?;
        }
        self.apply(SessionEvent::PasswordChanged);
        Ok(())
    }

    pub(crate) fn clear(&self, event: SessionEvent) -> Result<(), StoreError> {
        let removed = self.inner.store.remove_many(&SESSION_KEYS);
        self.apply(event);
        removed
    }

    fn apply(&self, event: SessionEvent) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        let next = previous.transition(event);
        if next != previous {
            info!(from = %previous, to = %next, ?event, "session state changed");
            *state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use aula_api_models::UserRole;

    fn profile(must_change_password: bool) -> UserProfile {
        UserProfile {
            id: 7,
            username: "ana".into(),
            email: "ana@example.org".into(),
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            tipo: UserRole::Alumno,
            telefono: None,
            fecha_nacimiento: None,
            direccion: None,
            activo: true,
            debe_cambiar_password: must_change_password,
            fecha_creacion: None,
            is_superuser: false,
        }
    }

    #[test]
    fn transitions_follow_the_lifecycle() {
        use SessionEvent::{Expired, LoggedOut, PasswordChanged, ProfileLoaded};
        use SessionState::{Authenticated, MustChangePassword, Unauthenticated};

        let forced = ProfileLoaded {
            must_change_password: true,
        };
        let normal = ProfileLoaded {
            must_change_password: false,
        };
        assert_eq!(Unauthenticated.transition(normal), Authenticated);
        assert_eq!(Unauthenticated.transition(forced), MustChangePassword);
        assert_eq!(Authenticated.transition(forced), MustChangePassword);
        assert_eq!(MustChangePassword.transition(PasswordChanged), Authenticated);
        assert_eq!(Unauthenticated.transition(PasswordChanged), Unauthenticated);
        for state in [Unauthenticated, Authenticated, MustChangePassword] {
            assert_eq!(state.transition(LoggedOut), Unauthenticated);
            assert_eq!(state.transition(Expired), Unauthenticated);
        }
    }

    #[test]
    fn caching_a_profile_drives_the_state() -> Result<()> {
        let session = SessionContext::in_memory();
        assert_eq!(session.state(), SessionState::Unauthenticated);
        session.store_tokens(&TokenPair {
            access: "a".into(),
            refresh: "r".into(),
        })?;

        session.cache_user(&profile(true))?;
        assert_eq!(session.state(), SessionState::MustChangePassword);

        session.mark_password_changed()?;
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(
            session.cached_user().map(|user| user.debe_cambiar_password),
            Some(false)
        );
        Ok(())
    }

    #[test]
    fn clear_removes_every_key() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let session = SessionContext::from_shared(store.clone());
        session.store_tokens(&TokenPair {
            access: "a".into(),
            refresh: "r".into(),
        })?;
        session.cache_user(&profile(false))?;
        assert_eq!(store.len(), 3);

        session.clear(SessionEvent::LoggedOut)?;
        assert!(store.is_empty());
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.cached_user().is_none());
        Ok(())
    }

    #[test]
    fn profile_arriving_after_logout_is_not_cached() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let session = SessionContext::from_shared(store.clone());
        session.store_tokens(&TokenPair {
            access: "a".into(),
            refresh: "r".into(),
        })?;
        session.clear(SessionEvent::LoggedOut)?;

        session.cache_user(&profile(false))?;

        assert!(store.is_empty());
        assert!(session.cached_user().is_none());
        assert_eq!(session.state(), SessionState::Unauthenticated);
        Ok(())
    }

    #[test]
    fn refreshed_grant_keeps_refresh_token_unless_rotated() -> Result<()> {
        let session = SessionContext::in_memory();
        session.store_tokens(&TokenPair {
            access: "a1".into(),
            refresh: "r1".into(),
        })?;
        session.store_refreshed(&AccessGrant {
            access: "a2".into(),
            refresh: None,
        })?;
        assert_eq!(session.access_token()?.as_deref(), Some("a2"));
        assert_eq!(session.refresh_token()?.as_deref(), Some("r1"));

        session.store_refreshed(&AccessGrant {
            access: "a3".into(),
            refresh: Some("r2".into()),
        })?;
        assert_eq!(session.refresh_token()?.as_deref(), Some("r2"));
        Ok(())
    }

    #[test]
    fn corrupt_cached_user_reads_as_absent() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_KEY, "{not json".to_string())?;
        let session = SessionContext::from_shared(store);
        assert!(session.cached_user().is_none());
        Ok(())
    }
}
