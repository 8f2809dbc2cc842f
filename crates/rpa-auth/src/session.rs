//! Auth session: the state every screen of one surface reads.
//!
//! An [`AuthSession`] is constructed explicitly and handed to whoever needs
//! it. It mirrors the surface's [`TokenStore`] in memory, drives the
//! [`SessionMachine`], and listens on the surface's [`LogoutSignal`] so an
//! invalidation raised by the HTTP client resets it.

use crate::claims::{normalize_token, TokenRejection, TokenVerdict};
use crate::machine::{SessionMachine, SessionMachineInput, SessionState};
use crate::signal::{LogoutNotice, LogoutSignal, SubscriptionId};
use crate::{AuthError, AuthResult, Surface};
use parking_lot::Mutex;
use rpa_storage::{KeyValueStorage, TokenStore};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Identity data shown by the UI. Never used for authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            role: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Backends send ids as integers or strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    pub token: Option<String>,
    pub profile: Option<Profile>,
    pub is_authenticated: bool,
}

/// Payload delivered to [`AuthSession::on_state_change`] observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStateChanged {
    pub surface: Surface,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Callback type for session state change notifications.
pub type AuthStateCallback = Box<dyn Fn(AuthStateChanged) + Send + Sync>;

struct SessionInner {
    machine: SessionMachine,
    token: Option<String>,
    profile: Option<Profile>,
}

impl SessionInner {
    fn clear(&mut self) {
        self.token = None;
        self.profile = None;
    }
}

/// Session state for one surface.
pub struct AuthSession {
    surface: Surface,
    store: TokenStore,
    signal: LogoutSignal,
    subscription: SubscriptionId,
    inner: Mutex<SessionInner>,
    state_callback: Mutex<Option<Arc<dyn Fn(AuthStateChanged) + Send + Sync>>>,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("surface", &self.surface)
            .field("state", &self.state())
            .finish()
    }
}

impl AuthSession {
    /// Build a session seeded from `store` and subscribed to `signal`.
    ///
    /// A stored token is restored and immediately re-checked; one that fails
    /// the surface's claim check is wiped from the store and the session
    /// starts anonymous.
    pub fn new(surface: Surface, store: TokenStore, signal: LogoutSignal) -> AuthResult<Arc<Self>> {
        let token = store
            .get_token()?
            .map(|t| normalize_token(&t))
            .filter(|t| !t.is_empty());
        let profile = store.get_profile::<Profile>()?;

        let session = Arc::new_cyclic(|weak: &Weak<AuthSession>| {
            let weak = weak.clone();
            let subscription = signal.subscribe(move |notice| {
                if let Some(session) = weak.upgrade() {
                    session.on_logout_notice(notice);
                }
            });

            AuthSession {
                surface,
                store,
                signal,
                subscription,
                inner: Mutex::new(SessionInner {
                    machine: SessionMachine::new(),
                    token: None,
                    profile,
                }),
                state_callback: Mutex::new(None),
            }
        });

        if let Some(token) = token {
            debug!(surface = %surface, "Restoring stored session");
            session.apply(SessionMachineInput::TokenRestored, |inner| {
                inner.token = Some(token);
            })?;
            // A rejected token has already been cleared by recheck.
            let _ = session.recheck();
        }

        Ok(session)
    }

    /// Build a session over `storage` using the surface's own keys.
    pub fn with_storage(
        surface: Surface,
        storage: Arc<dyn KeyValueStorage>,
        signal: LogoutSignal,
    ) -> AuthResult<Arc<Self>> {
        Self::new(surface, TokenStore::new(storage, surface.token_keys()), signal)
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn signal(&self) -> &LogoutSignal {
        &self.signal
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        SessionState::from(self.inner.lock().machine.state())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.lock().token.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.inner.lock().profile.clone()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        let inner = self.inner.lock();
        AuthSnapshot {
            token: inner.token.clone(),
            profile: inner.profile.clone(),
            is_authenticated: SessionState::from(inner.machine.state()).is_authenticated(),
        }
    }

    /// Set a callback to be notified of session state changes.
    pub fn on_state_change(&self, callback: AuthStateCallback) {
        *self.state_callback.lock() = Some(Arc::from(callback));
    }

    /// Record a token obtained from a login call.
    ///
    /// The token and profile are written through to the store before the
    /// state changes. Passing `None` for the profile removes any stored one.
    /// If the token then fails the claim check it is cleared again and
    /// [`AuthError::TokenRejected`] is returned.
    pub fn login(&self, token: &str, profile: Option<Profile>) -> AuthResult<()> {
        let token = normalize_token(token);
        if token.is_empty() {
            return Err(TokenRejection::Malformed("empty token".to_string()).into());
        }

        self.store.set_token(&token)?;
        match &profile {
            Some(profile) => self.store.set_profile(profile)?,
            None => self.store.clear_profile()?,
        }

        let profile_id = profile.as_ref().map(|p| p.id.clone());
        self.apply(SessionMachineInput::LoginSucceeded, |inner| {
            inner.token = Some(token);
            inner.profile = profile;
        })?;
        info!(surface = %self.surface, profile_id = ?profile_id, "Signed in");

        self.recheck().map_err(AuthError::from)
    }

    /// Forget the session: token, profile and refresh token are removed.
    ///
    /// Calling this on an anonymous session is a no-op. The logout signal is
    /// not raised.
    pub fn logout(&self) -> AuthResult<()> {
        self.apply(SessionMachineInput::LogoutRequested, SessionInner::clear)?;
        self.store.clear_all()?;
        info!(surface = %self.surface, "Signed out");
        Ok(())
    }

    /// Re-check the current token's claim type.
    ///
    /// Returns whether the session is still authenticated afterwards.
    pub fn revalidate(&self) -> bool {
        let _ = self.recheck();
        self.is_authenticated()
    }

    fn recheck(&self) -> Result<(), TokenRejection> {
        let Some(token) = self.token() else {
            return Ok(());
        };

        match self.surface.verify(&token) {
            TokenVerdict::Valid { claim_type, .. } => {
                debug!(surface = %self.surface, claim_type = ?claim_type, "Token accepted");
                Ok(())
            }
            TokenVerdict::Rejected(rejection) => {
                warn!(
                    surface = %self.surface,
                    kind = rejection.kind(),
                    "Discarding token that failed the claim check"
                );
                if let Err(e) = self.store.clear_all() {
                    warn!(surface = %self.surface, error = %e, "Failed to clear token store");
                }
                if self
                    .apply(SessionMachineInput::ClaimRejected, SessionInner::clear)
                    .is_err()
                {
                    self.inner.lock().clear();
                }
                Err(rejection)
            }
        }
    }

    fn on_logout_notice(&self, notice: &LogoutNotice) {
        if notice.surface != self.surface {
            return;
        }

        info!(
            surface = %self.surface,
            event = self.surface.logout_event(),
            reason = %notice.reason,
            "Session invalidated"
        );
        if let Err(e) = self.store.clear_all() {
            warn!(surface = %self.surface, error = %e, "Failed to clear token store");
        }
        if let Err(e) = self.apply(SessionMachineInput::LogoutBroadcast, SessionInner::clear) {
            warn!(surface = %self.surface, error = %e, "Ignoring logout notice");
        }
    }

    /// Consume `input`, apply `update` under the same lock, and notify the
    /// state callback when the state changed.
    fn apply<F>(&self, input: SessionMachineInput, update: F) -> AuthResult<SessionState>
    where
        F: FnOnce(&mut SessionInner),
    {
        let (old_state, new_state, profile_id) = {
            let mut inner = self.inner.lock();
            let old_state = SessionState::from(inner.machine.state());

            inner.machine.consume(&input).map_err(|_| {
                AuthError::InvalidStateTransition(format!(
                    "Cannot apply {:?} in state {:?}",
                    input,
                    inner.machine.state()
                ))
            })?;
            update(&mut inner);

            let new_state = SessionState::from(inner.machine.state());
            let profile_id = inner.profile.as_ref().map(|p| p.id.clone());
            (old_state, new_state, profile_id)
        };

        if old_state != new_state {
            debug!(
                surface = %self.surface,
                old_state = ?old_state,
                new_state = ?new_state,
                "Session state transition"
            );
            let callback = self.state_callback.lock().clone();
            if let Some(callback) = callback {
                callback(AuthStateChanged {
                    surface: self.surface,
                    state: new_state,
                    profile_id,
                });
            }
        }

        Ok(new_state)
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        self.signal.unsubscribe(self.subscription);
    }
}
