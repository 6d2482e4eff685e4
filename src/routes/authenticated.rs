use super::{LANDING_PATH, RouteEntry, View};

/// Authenticated Route Module
///
/// The main layout and everything nested in it. Only the root entry carries
/// `requires_auth`; the guard walks the ancestor chain, so every child is
/// protected without repeating the flag.
pub fn authenticated_routes() -> Vec<RouteEntry> {
    vec![RouteEntry {
        path: LANDING_PATH,
        name: "Layout",
        title: None,
        view: Some(View::MainLayout),
        requires_auth: true,
        // The layout itself has no content; land on the dashboard.
        redirect: Some("/dashboard"),
        children: vec![
            leaf("/dashboard", "Dashboard", "仪表盘", View::Dashboard),
            // /system
            // Menu grouping only. Not a navigation target by itself.
            RouteEntry {
                path: "/system",
                name: "System",
                title: Some("系统管理"),
                view: None,
                requires_auth: false,
                redirect: None,
                children: vec![
                    leaf("/system/users", "Users", "用户管理", View::Users),
                    leaf("/system/user-groups", "UserGroups", "用户组管理", View::UserGroups),
                ],
            },
        ],
    }]
}

fn leaf(path: &'static str, name: &'static str, title: &'static str, view: View) -> RouteEntry {
    RouteEntry {
        path,
        name,
        title: Some(title),
        view: Some(view),
        requires_auth: false,
        redirect: None,
        children: Vec::new(),
    }
}
