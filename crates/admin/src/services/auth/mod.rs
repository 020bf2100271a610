//! Bearer-token auth store.
//!
//! Holds the operator's opaque bearer token in memory and in durable storage,
//! and publishes a live "logged in" signal. The token is never inspected:
//! no expiry, signature or server-side validation.

mod error;
mod storage;

pub use error::AuthError;
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

use std::sync::{Arc, PoisonError, RwLock};

use futures::Stream;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;

/// Shared handle to the auth state.
///
/// Cloning is cheap; all clones observe the same token.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    token: RwLock<Option<SecretString>>,
    storage: Box<dyn TokenStorage>,
    logged_in: watch::Sender<bool>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("token", &"[REDACTED]")
            .field("logged_in", &self.is_authenticated())
            .finish()
    }
}

impl AuthStore {
    /// Create a store backed by `storage`.
    ///
    /// The logged-in flag starts from whatever token the storage already holds.
    #[must_use]
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        let persisted = match storage.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted token, starting logged out");
                None
            }
        };
        let (logged_in, _) = watch::channel(persisted.is_some());

        Self {
            inner: Arc::new(AuthStoreInner {
                token: RwLock::new(persisted),
                storage: Box::new(storage),
                logged_in,
            }),
        }
    }

    /// Store a new token in memory and in durable storage.
    ///
    /// The in-memory token and the logged-in flag are updated even when the
    /// durable write fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmptyToken` for a blank token, or
    /// `AuthError::Storage` if persisting it failed.
    pub fn set_token(&self, token: impl Into<String>) -> Result<(), AuthError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AuthError::EmptyToken);
        }
        let token = SecretString::from(token);

        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        self.publish(true);

        self.inner.storage.save(&token)
    }

    /// Current token: the in-memory copy, falling back to durable storage.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        let in_memory = self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        in_memory
            .or_else(|| match self.inner.storage.load() {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read persisted token");
                    None
                }
            })
            .filter(|t| !t.expose_secret().is_empty())
    }

    /// Forget the token everywhere and mark the operator logged out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the durable copy could not be removed.
    /// Memory is cleared regardless.
    pub fn logout(&self) -> Result<(), AuthError> {
        *self.inner.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.publish(false);
        self.inner.storage.clear()
    }

    /// Current value of the logged-in flag.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.inner.logged_in.borrow()
    }

    /// Subscribe to the logged-in flag.
    ///
    /// The receiver sees the current value immediately via `borrow()` and is
    /// notified on each change.
    #[must_use]
    pub fn is_logged_in(&self) -> watch::Receiver<bool> {
        self.inner.logged_in.subscribe()
    }

    /// The logged-in flag as a stream: the current value first, then every change.
    pub fn logged_in_stream(&self) -> impl Stream<Item = bool> + Send + 'static {
        let mut rx = self.is_logged_in();
        async_stream::stream! {
            let current = *rx.borrow_and_update();
            yield current;
            while rx.changed().await.is_ok() {
                let next = *rx.borrow_and_update();
                yield next;
            }
        }
    }

    fn publish(&self, logged_in: bool) {
        self.inner.logged_in.send_if_modified(|current| {
            let changed = *current != logged_in;
            *current = logged_in;
            changed
        });
    }
}
