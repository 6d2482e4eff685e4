mod common;

use std::sync::Arc;

use common::{VALID_TOKEN, console_for, spawn_api};
use harbor_console::{
    ConsoleError, FileStore, KeyValueStore, MemoryStore, models::LoginRequest,
    session::TOKEN_KEY,
};

fn credentials(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_login_persists_token_across_restarts() {
    let api = spawn_api().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let storage = Arc::new(FileStore::open(dir.path()).unwrap());
        let (console, _) = console_for(&api, storage);
        assert!(!console.session.is_authenticated());

        let result = console.login(&credentials("admin", "secret")).await.unwrap();

        assert_eq!(result.token, VALID_TOKEN);
        assert_eq!(result.message, "login success");
        assert_eq!(console.session.token(), VALID_TOKEN);
        assert_eq!(console.session.user().unwrap().username, "admin");
        // The login request itself is sent without a bearer header.
        assert!(api.last().headers.get("authorization").is_none());
    }

    // A fresh console over the same directory picks the token back up.
    let storage = Arc::new(FileStore::open(dir.path()).unwrap());
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some(VALID_TOKEN));
    let (console, _) = console_for(&api, storage);

    assert!(console.session.is_authenticated());
    assert!(console.session.user().is_none());
    console.users.get(1).await.unwrap();
}

#[tokio::test]
async fn test_failed_login_leaves_session_unchanged() {
    let api = spawn_api().await;
    let storage = Arc::new(MemoryStore::with_item(TOKEN_KEY, "previous"));
    let (console, notifier) = console_for(&api, storage.clone());

    let err = console
        .login(&credentials("admin", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConsoleError::Api { status: 400, .. }));
    assert_eq!(console.session.token(), "previous");
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("previous"));
    assert_eq!(notifier.errors(), ["invalid username or password"]);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let api = spawn_api().await;
    let storage = Arc::new(MemoryStore::with_item(TOKEN_KEY, VALID_TOKEN));
    let (console, notifier) = console_for(&api, storage.clone());
    console.open("/system/users").unwrap();

    console.logout();
    console.logout();

    assert_eq!(console.session.token(), "");
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert!(console.navigator.current().is_login());
    // Logout is local only.
    assert_eq!(api.count(), 0);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn test_guard_redirects_and_resumes_after_login() {
    let api = spawn_api().await;
    let (console, _) = console_for(&api, Arc::new(MemoryStore::new()));

    let location = console.open("/system/user-groups").unwrap();
    assert_eq!(location.to_string(), "/login?redirect=%2Fsystem%2Fuser-groups");

    console.login(&credentials("admin", "secret")).await.unwrap();

    assert_eq!(console.navigator.current().path, "/system/user-groups");
}

#[tokio::test]
async fn test_login_with_unknown_redirect_still_succeeds() {
    let api = spawn_api().await;
    let storage = Arc::new(MemoryStore::new());
    let (console, _) = console_for(&api, storage.clone());
    console.open("/login?redirect=/nowhere").unwrap();

    let result = console.login(&credentials("admin", "secret")).await.unwrap();

    assert_eq!(result.token, VALID_TOKEN);
    assert!(console.session.is_authenticated());
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some(VALID_TOKEN));
    assert_eq!(console.navigator.current().path, "/dashboard");
}

#[tokio::test]
async fn test_login_without_redirect_lands_on_dashboard() {
    let api = spawn_api().await;
    let (console, _) = console_for(&api, Arc::new(MemoryStore::new()));

    console.login(&credentials("admin", "secret")).await.unwrap();

    assert_eq!(console.navigator.current().path, "/dashboard");
    // Authenticated users are bounced off the login page.
    assert_eq!(console.open("/login").unwrap().path, "/dashboard");
}

#[tokio::test]
async fn test_expired_session_redirect_is_resumable() {
    let api = spawn_api().await;
    let (console, _) = console_for(
        &api,
        Arc::new(MemoryStore::with_item(TOKEN_KEY, common::EXPIRED_TOKEN)),
    );
    console.open("/dashboard").unwrap();

    let _ = console.users.get(1).await.unwrap_err();
    assert!(console.navigator.current().is_login());

    // Any protected route now bounces back to login with a redirect.
    let location = console.open("/system/users").unwrap();
    assert_eq!(
        location.redirect_target().unwrap().path,
        "/system/users"
    );
}

#[test]
fn test_unknown_route_is_an_error() {
    let console = harbor_console::create_console(
        harbor_console::ConsoleConfig::default(),
        Arc::new(MemoryStore::with_item(TOKEN_KEY, VALID_TOKEN)),
        Arc::new(harbor_console::MemoryNotifier::new()),
    )
    .unwrap();

    let err = console.open("/nowhere").unwrap_err();
    assert!(matches!(err, ConsoleError::RouteNotFound(path) if path == "/nowhere"));
    // The group entry has no view of its own.
    assert!(matches!(
        console.open("/system"),
        Err(ConsoleError::RouteNotFound(_))
    ));
}
