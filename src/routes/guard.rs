use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    LANDING_PATH, LOGIN_PATH, Location, REDIRECT_QUERY_KEY, RouteEntry, resolve, route_table,
};
use crate::{error::ConsoleError, session::SessionStore};

const MAX_REDIRECTS: usize = 8;

/// Outcome of running the guard against one navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(Location),
}

/// guard
///
/// Decides whether `target` (resolved to `chain`, root first) may be
/// committed given the current authentication state.
///
/// - protected route (itself or any ancestor) while logged out: go to the
///   login route, carrying the full target in the `redirect` query key.
/// - login route while logged in: go to the landing route.
/// - anything else proceeds.
pub fn guard(chain: &[&RouteEntry], target: &Location, authenticated: bool) -> GuardDecision {
    let requires_auth = chain.iter().any(|route| route.requires_auth);

    if requires_auth && !authenticated {
        return GuardDecision::Redirect(
            Location::new(LOGIN_PATH).with_query(REDIRECT_QUERY_KEY, &target.to_string()),
        );
    }
    if target.is_login() && authenticated {
        return GuardDecision::Redirect(Location::new(LANDING_PATH));
    }
    GuardDecision::Proceed
}

/// Navigator
///
/// Holds the route table and the current location, and runs the guard before
/// every committed navigation. The guard and the commit happen under one
/// lock, so no protected location is ever observable before its redirect.
pub struct Navigator {
    routes: Vec<RouteEntry>,
    session: Arc<SessionStore>,
    current: Mutex<Location>,
}

impl Navigator {
    /// Starts on the login route, which every session may see.
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            routes: route_table(),
            session,
            current: Mutex::new(Location::new(LOGIN_PATH)),
        }
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn current(&self) -> Location {
        self.current.lock().clone()
    }

    /// navigate
    ///
    /// Resolves `target` against the route table, applies the guard and any
    /// static redirects until a location is allowed, then commits it.
    ///
    /// Each hop re-resolves the new location and runs the guard again, so a
    /// static redirect can never land the user on a protected route the
    /// session is not allowed to see. The current-location lock is held for
    /// the whole decision: readers observe either the old location or the
    /// final one, never an intermediate hop.
    ///
    /// # Arguments
    /// * `target`: A path with an optional query string, e.g.
    ///   `/system/users?page=2`. Query values are percent-decoded.
    ///
    /// # Errors
    /// * `RouteNotFound` when any hop names a path outside the route table.
    ///   The current location is left unchanged.
    /// * `RedirectLoop` after more than eight hops.
    pub fn navigate(&self, target: &str) -> Result<Location, ConsoleError> {
        let requested = Location::parse(target);
        let mut current = self.current.lock();
        let mut next = requested.clone();

        for _ in 0..MAX_REDIRECTS {
            let chain = resolve(&self.routes, &next.path)
                .ok_or_else(|| ConsoleError::RouteNotFound(next.path.clone()))?;

            if let GuardDecision::Redirect(redirect) =
                guard(&chain, &next, self.session.is_authenticated())
            {
                tracing::debug!(from = %next, to = %redirect, "navigation redirected by guard");
                next = redirect;
                continue;
            }

            if let Some(redirect) = chain.last().and_then(|route| route.redirect) {
                next = Location::new(redirect);
                continue;
            }

            tracing::debug!(location = %next, "navigation committed");
            *current = next.clone();
            return Ok(next);
        }

        Err(ConsoleError::RedirectLoop(requested.to_string()))
    }

    /// Sends the console to the login route without consulting the guard.
    /// Used when the server reports the session as expired.
    pub fn force_login(&self) {
        *self.current.lock() = Location::new(LOGIN_PATH);
    }

    /// resume_after_login
    ///
    /// After a successful login, returns to the location the guard
    /// interrupted, or to the landing route when there was none.
    ///
    /// The preserved target comes from a query string and may name a route
    /// that does not exist. Such a target is logged and replaced by the
    /// landing route, so a login never fails on account of its redirect.
    ///
    /// # Errors
    /// Only when the landing route itself cannot be committed.
    pub fn resume_after_login(&self) -> Result<Location, ConsoleError> {
        let Some(target) = self.current().redirect_target() else {
            return self.navigate(LANDING_PATH);
        };
        match self.navigate(&target.to_string()) {
            Ok(location) => Ok(location),
            Err(e) => {
                tracing::warn!(redirect = %target, error = %e, "redirect target rejected, landing instead");
                self.navigate(LANDING_PATH)
            }
        }
    }
}
