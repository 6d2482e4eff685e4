use std::sync::Arc;

// --- Module Structure ---

// Ambient concerns shared by every component.
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;

// Wire types of the HarborArk API.
pub mod models;

// Session state, navigation, and the HTTP pipeline.
pub mod pipeline;
pub mod routes;
pub mod session;

// Typed endpoint clients.
pub mod api;

// --- Public Re-exports ---

pub use api::{AuthApi, UserGroupsApi, UsersApi};
pub use config::ConsoleConfig;
pub use error::ConsoleError;
pub use notify::{MemoryNotifier, Notifier, NotifierState, TracingNotifier};
pub use pipeline::RequestPipeline;
pub use routes::{Location, Navigator};
pub use session::{Session, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageState};

use models::{LoginRequest, LoginResult};
use pipeline::{BearerAuth, ErrorNotice, RequestId, SessionExpiry};

/// Console
///
/// The unified state of one console instance: session, navigator, pipeline
/// and the endpoint clients, all wired to each other explicitly. Nothing is
/// global, so independent consoles (and tests) never share state.
#[derive(Clone)]
pub struct Console {
    pub config: ConsoleConfig,
    pub session: Arc<SessionStore>,
    pub navigator: Arc<Navigator>,
    pub pipeline: Arc<RequestPipeline>,
    pub notifier: NotifierState,
    pub auth: AuthApi,
    pub users: UsersApi,
    pub user_groups: UserGroupsApi,
}

/// create_console
///
/// Assembles a console: restores the session from `storage`, builds the
/// navigator over it, and installs the middleware chain in its fixed order:
///
/// 1. `RequestId`: fresh `x-request-id` on every request.
/// 2. `BearerAuth`: `Authorization: Bearer <token>` while a token is held.
/// 3. `SessionExpiry`: on 401, logout, jump to `/login`, notify.
/// 4. `ErrorNotice`: every other failure is surfaced through `notifier`.
///
/// The session store, navigator and pipeline are shared by `Arc` between the
/// middleware and the returned `Console`, so a 401 observed by any client is
/// visible to all of them immediately.
///
/// # Arguments
/// * `config`: The loaded configuration. Its base URL, timeout and locale
///   are fixed into the pipeline here.
/// * `storage`: Durable storage; the session token is read from it once.
/// * `notifier`: Receives every user-visible notice the pipeline raises.
///
/// # Errors
/// * `ConsoleError::Storage` when the persisted token cannot be read.
/// * `ConsoleError::Config` when the HTTP client cannot be built or the
///   locale is not a valid header value.
pub fn create_console(
    config: ConsoleConfig,
    storage: StorageState,
    notifier: NotifierState,
) -> Result<Console, ConsoleError> {
    let session = Arc::new(SessionStore::restore(storage)?);
    let navigator = Arc::new(Navigator::new(session.clone()));

    let pipeline = Arc::new(
        RequestPipeline::new(&config)?
            .with_middleware(Arc::new(RequestId))
            .with_middleware(Arc::new(BearerAuth::new(session.clone())))
            .with_middleware(Arc::new(SessionExpiry::new(
                session.clone(),
                navigator.clone(),
                notifier.clone(),
            )))
            .with_middleware(Arc::new(ErrorNotice::new(notifier.clone()))),
    );

    tracing::debug!(
        base_url = pipeline.base_url(),
        middleware = ?pipeline.middleware_names(),
        authenticated = session.is_authenticated(),
        "console assembled"
    );

    Ok(Console {
        auth: AuthApi::new(pipeline.clone()),
        users: UsersApi::new(pipeline.clone()),
        user_groups: UserGroupsApi::new(pipeline.clone()),
        config,
        session,
        navigator,
        pipeline,
        notifier,
    })
}

impl Console {
    /// login
    ///
    /// Logs in through the session store, then returns to whatever route
    /// the guard interrupted (or the landing route).
    ///
    /// An `Err` means the session and the persisted token are untouched.
    /// Once the session is installed the call succeeds: navigation after
    /// that point is best-effort and only logged when it fails.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResult, ConsoleError> {
        let result = self.session.login(&self.auth, credentials).await?;
        match self.navigator.resume_after_login() {
            Ok(location) => tracing::debug!(%location, "resumed after login"),
            Err(e) => tracing::warn!(error = %e, "could not navigate after login"),
        }
        Ok(result)
    }

    /// Clears the session locally and shows the login route.
    pub fn logout(&self) {
        self.session.logout();
        self.navigator.force_login();
    }

    /// Navigates through the guard. See [`Navigator::navigate`].
    pub fn open(&self, path: &str) -> Result<Location, ConsoleError> {
        self.navigator.navigate(path)
    }
}
