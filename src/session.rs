use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{
    error::ConsoleError,
    models::{LoginRequest, LoginResult, User},
    storage::StorageState,
};

/// Durable storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Session
///
/// The current authentication state. `token` is empty when logged out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

/// AuthGateway
///
/// The login endpoint as seen by the session store. Implemented by
/// `api::auth::AuthApi`; tests substitute canned gateways.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResult, ConsoleError>;
}

/// SessionStore
///
/// Owns the session and keeps its token mirrored in durable storage. One
/// store is built per console context and shared behind an `Arc` with the
/// pipeline middleware and the navigator.
pub struct SessionStore {
    state: RwLock<Session>,
    storage: StorageState,
}

impl SessionStore {
    /// restore
    ///
    /// Builds the store from whatever token durable storage holds. The user
    /// profile is never persisted, so it always starts unset.
    pub fn restore(storage: StorageState) -> Result<Self, ConsoleError> {
        let token = storage.get_item(TOKEN_KEY)?.unwrap_or_default();
        tracing::debug!(restored = !token.is_empty(), "session restored from storage");
        Ok(Self {
            state: RwLock::new(Session { token, user: None }),
            storage,
        })
    }

    pub fn token(&self) -> String {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Derived from the token on every call.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    /// login
    ///
    /// Calls the gateway and, only once it succeeds, persists the returned
    /// token and installs it together with the profile. Any error (from the
    /// gateway or from storage) leaves the session exactly as it was.
    ///
    /// The write lock is held across the storage write, so concurrent
    /// logins resolve last-wins with memory and storage agreeing on the
    /// winner. No `.await` happens while the lock is held.
    pub async fn login<G>(
        &self,
        gateway: &G,
        credentials: &LoginRequest,
    ) -> Result<LoginResult, ConsoleError>
    where
        G: AuthGateway + ?Sized,
    {
        let result = gateway.login(credentials).await?;

        {
            let mut state = self.state.write();
            self.storage.set_item(TOKEN_KEY, &result.token)?;
            state.token = result.token.clone();
            state.user = Some(result.user.clone());
        }

        tracing::info!(username = %result.user.username, "logged in");
        Ok(result)
    }

    /// logout
    ///
    /// Purely local: clears token and profile and drops the persisted token.
    /// Safe to call when already logged out. A storage failure is logged, not
    /// returned; the in-memory session is cleared regardless.
    pub fn logout(&self) {
        let mut state = self.state.write();
        state.token.clear();
        state.user = None;
        // Storage is updated under the write lock, as in `login`.
        if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
            tracing::warn!(error = %e, "failed to remove persisted token");
        }
    }

    /// Replaces the profile wholesale. The token is untouched.
    pub fn set_user(&self, user: User) {
        self.state.write().user = Some(user);
    }
}
