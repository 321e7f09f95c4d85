//! Session state over the hosted auth service.
//!
//! The service itself is external; only its interface is modeled here as
//! the [`AuthProvider`] trait. [`SessionStore`] is the explicitly
//! constructed replacement for ambient auth context: built once
//! (subscribing to provider session changes), injected where identity is
//! needed, and disposed (unsubscribing) when torn down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email address has not been confirmed")]
    EmailUnconfirmed,
    #[error("authentication failed: {0}")]
    Other(String),
}

/// Callback fired on every session change (login, logout, token refresh).
pub type SessionCallback = Box<dyn Fn(Option<&Session>) + Send + Sync>;

/// Opaque handle returned by [`AuthProvider::subscribe`].
pub type SubscriptionToken = u64;

pub trait AuthProvider: Send + Sync {
    fn current_session(&self) -> Option<Session>;
    fn login(&self, identifier: &str, secret: &str) -> Result<Session, AuthError>;
    fn signup(&self, identifier: &str, secret: &str) -> Result<(), AuthError>;
    fn logout(&self);
    /// Explicit user-triggered re-send of the confirmation email. The only
    /// retry in the system; nothing else retries automatically.
    fn resend_confirmation(&self, identifier: &str) -> Result<(), AuthError>;
    fn subscribe(&self, callback: SessionCallback) -> SubscriptionToken;
    fn unsubscribe(&self, token: SubscriptionToken);
}

/// Cached view of the provider's session, kept current via subscription.
///
/// Lifecycle: `new` subscribes, reads stay cheap while active, and
/// [`dispose`](Self::dispose) (or Drop) unsubscribes.
pub struct SessionStore {
    provider: Arc<dyn AuthProvider>,
    session: Arc<RwLock<Option<Session>>>,
    token: Option<SubscriptionToken>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let session = Arc::new(RwLock::new(provider.current_session()));
        let cache = session.clone();
        let token = provider.subscribe(Box::new(move |s| {
            *cache.write() = s.cloned();
        }));
        debug!("session store initialized");
        Self {
            provider,
            session,
            token: Some(token),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    pub fn login(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        self.provider.login(identifier, secret)
    }

    pub fn signup(&self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        self.provider.signup(identifier, secret)
    }

    pub fn logout(&self) {
        self.provider.logout();
    }

    pub fn resend_confirmation(&self, identifier: &str) -> Result<(), AuthError> {
        self.provider.resend_confirmation(identifier)
    }

    /// Unsubscribe from the provider. Idempotent; reads keep returning the
    /// last cached session but no longer track changes.
    pub fn dispose(&mut self) {
        if let Some(token) = self.token.take() {
            self.provider.unsubscribe(token);
            debug!("session store disposed");
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ===== Local provider =====

struct Account {
    password: String,
    confirmed: bool,
}

/// In-memory stand-in for the hosted auth service, used by the REPL and
/// tests. Signup creates an unconfirmed account; logging in before
/// confirmation fails with `EmailUnconfirmed`, and `resend_confirmation`
/// confirms immediately (there is no mail to wait for).
#[derive(Default)]
pub struct LocalAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    subscribers: Mutex<HashMap<SubscriptionToken, SessionCallback>>,
    next_token: AtomicU64,
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a confirmed account, as if signup and email confirmation
    /// already happened.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.accounts.lock().insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                confirmed: true,
            },
        );
        self
    }

    fn notify(&self, session: Option<&Session>) {
        for callback in self.subscribers.lock().values() {
            callback(session);
        }
    }

    fn set_session(&self, session: Option<Session>) {
        *self.session.write() = session.clone();
        self.notify(session.as_ref());
    }
}

impl AuthProvider for LocalAuthProvider {
    fn current_session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn login(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        {
            let accounts = self.accounts.lock();
            let account = accounts
                .get(identifier)
                .ok_or(AuthError::InvalidCredentials)?;
            if account.password != secret {
                return Err(AuthError::InvalidCredentials);
            }
            if !account.confirmed {
                return Err(AuthError::EmailUnconfirmed);
            }
        }
        let session = Session {
            user_id: format!("user-{identifier}"),
            email: identifier.to_string(),
        };
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    fn signup(&self, identifier: &str, secret: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(identifier) {
            return Err(AuthError::Other("account already exists".to_string()));
        }
        accounts.insert(
            identifier.to_string(),
            Account {
                password: secret.to_string(),
                confirmed: false,
            },
        );
        Ok(())
    }

    fn logout(&self) {
        self.set_session(None);
    }

    fn resend_confirmation(&self, identifier: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts.lock();
        let account = accounts
            .get_mut(identifier)
            .ok_or(AuthError::InvalidCredentials)?;
        account.confirmed = true;
        Ok(())
    }

    fn subscribe(&self, callback: SessionCallback) -> SubscriptionToken {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().insert(token, callback);
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.subscribers.lock().remove(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_with_wrong_password_is_invalid_credentials() {
        let provider = LocalAuthProvider::new().with_account("a@b.c", "pw");
        assert_eq!(
            provider.login("a@b.c", "nope").unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            provider.login("ghost@b.c", "pw").unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn signup_requires_confirmation_before_login() {
        let provider = LocalAuthProvider::new();
        provider.signup("new@b.c", "pw").unwrap();
        assert_eq!(
            provider.login("new@b.c", "pw").unwrap_err(),
            AuthError::EmailUnconfirmed
        );

        provider.resend_confirmation("new@b.c").unwrap();
        assert!(provider.login("new@b.c", "pw").is_ok());
    }

    #[test]
    fn duplicate_signup_is_rejected() {
        let provider = LocalAuthProvider::new().with_account("a@b.c", "pw");
        assert!(matches!(
            provider.signup("a@b.c", "pw").unwrap_err(),
            AuthError::Other(_)
        ));
    }

    #[test]
    fn session_store_tracks_login_and_logout() {
        let provider = Arc::new(LocalAuthProvider::new().with_account("a@b.c", "pw"));
        let store = SessionStore::new(provider.clone());
        assert!(!store.is_authenticated());

        store.login("a@b.c", "pw").unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.session().unwrap().email, "a@b.c");

        store.logout();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn session_store_picks_up_existing_session() {
        let provider = Arc::new(LocalAuthProvider::new().with_account("a@b.c", "pw"));
        provider.login("a@b.c", "pw").unwrap();

        let store = SessionStore::new(provider);
        assert!(store.is_authenticated());
    }

    #[test]
    fn disposed_store_stops_tracking() {
        let provider = Arc::new(LocalAuthProvider::new().with_account("a@b.c", "pw"));
        let mut store = SessionStore::new(provider.clone());
        store.dispose();
        store.dispose(); // idempotent

        provider.login("a@b.c", "pw").unwrap();
        assert!(!store.is_authenticated());
    }
}
