use super::{LOGIN_PATH, RouteEntry, View};

/// Public Route Module
///
/// Routes any visitor may open. The guard still intervenes on the login
/// route, but only to send an already authenticated user away from it.
pub fn public_routes() -> Vec<RouteEntry> {
    vec![
        // /login
        // Credential form. Target of every authentication redirect.
        RouteEntry {
            path: LOGIN_PATH,
            name: "Login",
            title: None,
            view: Some(View::Login),
            requires_auth: false,
            redirect: None,
            children: Vec::new(),
        },
    ]
}
