use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use uuid::Uuid;

use super::{NETWORK_FAILURE_MESSAGE, OutgoingRequest, ResponseFailure, SESSION_EXPIRED_MESSAGE};
use crate::{
    error::ConsoleError, notify::NotifierState, routes::Navigator, session::SessionStore,
};

/// Correlation header stamped on every request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware
///
/// One link of the pipeline's chain. Both hooks default to no-ops so a
/// middleware only implements the side it cares about.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs before the request is sent. An error aborts the call.
    fn before_send(&self, _request: &mut OutgoingRequest) -> Result<(), ConsoleError> {
        Ok(())
    }

    /// Runs after a failed call, before the error reaches the caller.
    fn after_failure(&self, _failure: &ResponseFailure) {}
}

/// RequestId
///
/// Gives every outgoing request a fresh UUID so client and server log lines
/// for one call can be joined.
#[derive(Debug, Default)]
pub struct RequestId;

impl Middleware for RequestId {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn before_send(&self, request: &mut OutgoingRequest) -> Result<(), ConsoleError> {
        let id = Uuid::new_v4().to_string();
        let value = HeaderValue::from_str(&id)
            .map_err(|e| ConsoleError::Validation(format!("request id header: {e}")))?;
        request
            .headers
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        Ok(())
    }
}

/// BearerAuth
///
/// Attaches `Authorization: Bearer <token>` whenever the session holds a
/// token, and guarantees the header is absent when it does not. The token is
/// read at send time, so a login or logout takes effect on the next call.
pub struct BearerAuth {
    session: Arc<SessionStore>,
}

impl BearerAuth {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer_auth"
    }

    fn before_send(&self, request: &mut OutgoingRequest) -> Result<(), ConsoleError> {
        let token = self.session.token();
        if token.is_empty() {
            request.headers.remove(AUTHORIZATION);
            return Ok(());
        }
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ConsoleError::Validation("stored token is not a valid header value".to_string())
        })?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// SessionExpiry
///
/// Reacts to HTTP 401 from any endpoint: clears the session (and its
/// persisted token), forces the navigator onto the login route, and tells
/// the user. Every caller gets this without handling 401 itself.
pub struct SessionExpiry {
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
    notifier: NotifierState,
}

impl SessionExpiry {
    pub fn new(
        session: Arc<SessionStore>,
        navigator: Arc<Navigator>,
        notifier: NotifierState,
    ) -> Self {
        Self {
            session,
            navigator,
            notifier,
        }
    }
}

impl Middleware for SessionExpiry {
    fn name(&self) -> &'static str {
        "session_expiry"
    }

    fn after_failure(&self, failure: &ResponseFailure) {
        if !failure.is_unauthorized() {
            return;
        }
        tracing::info!(path = %failure.path, "server rejected session, logging out");
        self.session.logout();
        self.navigator.force_login();
        self.notifier.error(SESSION_EXPIRED_MESSAGE);
    }
}

/// ErrorNotice
///
/// Surfaces every other failure: the server's own message verbatim when the
/// error body has one, otherwise a generic network notice.
pub struct ErrorNotice {
    notifier: NotifierState,
}

impl ErrorNotice {
    pub fn new(notifier: NotifierState) -> Self {
        Self { notifier }
    }
}

impl Middleware for ErrorNotice {
    fn name(&self) -> &'static str {
        "error_notice"
    }

    fn after_failure(&self, failure: &ResponseFailure) {
        if failure.is_unauthorized() {
            return;
        }
        match &failure.message {
            Some(message) => self.notifier.error(message),
            None => self.notifier.error(NETWORK_FAILURE_MESSAGE),
        }
    }
}
