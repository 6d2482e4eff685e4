//! Route Table Index
//!
//! The console's single, authoritative route table. Routes are split by
//! access level the same way the API surface is: everything under
//! `public` is reachable without a session, everything under `authenticated`
//! sits below a root entry marked `requires_auth`, which the guard applies
//! to the whole subtree.

use std::fmt;

/// Routes reachable without a session.
pub mod public;

/// Routes that require an authenticated session (inherited by children).
pub mod authenticated;

/// The navigation guard and the navigator that applies it.
pub mod guard;

pub use guard::{GuardDecision, Navigator, guard};

pub const LOGIN_PATH: &str = "/login";
/// Where an authenticated user lands when no other target applies.
pub const LANDING_PATH: &str = "/";
/// Query key carrying the originally requested location through login.
pub const REDIRECT_QUERY_KEY: &str = "redirect";

/// View
///
/// The screen a route renders. Grouping routes have no view of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    MainLayout,
    Dashboard,
    Users,
    UserGroups,
}

/// RouteEntry
///
/// One node of the static route tree. Child paths are absolute.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: &'static str,
    pub name: &'static str,
    pub title: Option<&'static str>,
    pub view: Option<View>,
    pub requires_auth: bool,
    // Static redirect taken whenever this route is the final match.
    pub redirect: Option<&'static str>,
    pub children: Vec<RouteEntry>,
}

impl RouteEntry {
    /// A route is a navigation target if it renders something or redirects.
    fn is_navigable(&self) -> bool {
        self.view.is_some() || self.redirect.is_some()
    }
}

/// Builds the full route table. Called once per navigator.
pub fn route_table() -> Vec<RouteEntry> {
    let mut routes = public::public_routes();
    routes.extend(authenticated::authenticated_routes());
    routes
}

/// resolve
///
/// Finds the route matching `path` and returns the chain of entries from the
/// top-level ancestor down to the match. Trailing slashes are ignored.
pub fn resolve<'a>(routes: &'a [RouteEntry], path: &str) -> Option<Vec<&'a RouteEntry>> {
    let path = normalize_path(path);
    for route in routes {
        let mut chain = Vec::new();
        if find(route, &path, &mut chain) {
            return Some(chain);
        }
    }
    None
}

fn find<'a>(route: &'a RouteEntry, path: &str, chain: &mut Vec<&'a RouteEntry>) -> bool {
    chain.push(route);
    if route.path == path && route.is_navigable() {
        return true;
    }
    for child in &route.children {
        if find(child, path, chain) {
            return true;
        }
    }
    chain.pop();
    false
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let with_slash = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    match with_slash.trim_end_matches('/') {
        "" => "/".to_string(),
        other => other.to_string(),
    }
}

/// Location
///
/// A path plus its query pairs, in order. What the navigator commits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Parses `path?key=value&...`, percent-decoding the query pairs.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let mut location = Self::new(path);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            location.query.push((decode(key), decode(value)));
        }
        location
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The location a login redirect preserved, if any.
    pub fn redirect_target(&self) -> Option<Location> {
        self.query_value(REDIRECT_QUERY_KEY)
            .filter(|target| target.starts_with('/'))
            .map(Location::parse)
    }

    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{sep}{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )?;
        }
        Ok(())
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
