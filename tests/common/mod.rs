#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use harbor_console::{
    Console, ConsoleConfig, MemoryNotifier, create_console, storage::StorageState,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const VALID_TOKEN: &str = "valid-token";
pub const EXPIRED_TOKEN: &str = "expired-token";

/// One request as the fake API saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
struct FakeState {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// A HarborArk stand-in bound to an ephemeral port.
pub struct FakeApi {
    pub address: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeApi {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("fake api saw no requests")
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn config(&self) -> ConsoleConfig {
        ConsoleConfig {
            api_url: self.address.clone(),
            ..ConsoleConfig::default()
        }
    }
}

pub async fn spawn_api() -> FakeApi {
    let state = FakeState::default();
    let router = Router::new().fallback(handle).with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    FakeApi {
        address,
        requests: state.requests,
    }
}

/// A console wired to `api`, with a recording notifier.
pub fn console_for(api: &FakeApi, storage: StorageState) -> (Console, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let console = create_console(api.config(), storage, notifier.clone()).unwrap();
    (console, notifier)
}

pub fn user_json(id: u32, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@harbor.local"),
        "full_name": "Harbor Admin",
        "user_group_id": 1,
        "is_active": true,
        "created_at": "2024-05-01T08:00:00+08:00",
        "updated_at": "2024-05-01T08:00:00Z"
    })
}

pub fn group_json(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "operators",
        "permissions": ["users:read", "users:write"],
        "created_at": "2024-05-01T08:00:00Z",
        "updated_at": "2024-05-01T08:00:00Z"
    })
}

fn envelope(status: StatusCode, message: &str, data: Value) -> Response {
    (
        status,
        Json(json!({ "code": status.as_u16(), "message": message, "data": data })),
    )
        .into_response()
}

fn page(list: Vec<Value>, query: Option<&str>) -> Value {
    let param = |key: &str, default: u32| {
        query
            .unwrap_or("")
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.parse::<u32>().ok())
            .unwrap_or(default)
    };
    json!({
        "total": list.len(),
        "list": list,
        "page": param("page", 1),
        "page_size": param("page_size", 10),
    })
}

async fn handle(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/api/v1").to_string();
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    state.requests.lock().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers: headers.clone(),
        body: body.clone(),
    });

    if path == "/auth/login" && method == Method::POST {
        let body = body.unwrap_or(Value::Null);
        return if body["username"] == "admin" && body["password"] == "secret" {
            envelope(
                StatusCode::OK,
                "login success",
                json!({ "token": VALID_TOKEN, "user": user_json(1, "admin") }),
            )
        } else {
            envelope(StatusCode::BAD_REQUEST, "invalid username or password", Value::Null)
        };
    }

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {VALID_TOKEN}"));
    if !authorized {
        return envelope(StatusCode::UNAUTHORIZED, "unauthorized", Value::Null);
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (Method::GET, ["users"]) => envelope(
            StatusCode::OK,
            "get success",
            page(vec![user_json(1, "admin"), user_json(2, "ops")], uri.query()),
        ),
        (Method::GET, ["users", "999"]) => {
            envelope(StatusCode::NOT_FOUND, "user not found", Value::Null)
        }
        (Method::GET, ["users", id]) => {
            let id = id.parse().unwrap_or(0);
            envelope(StatusCode::OK, "get success", user_json(id, "admin"))
        }
        (Method::POST, ["users"]) => {
            let body = body.unwrap_or(Value::Null);
            if body["username"] == "taken" {
                return envelope(StatusCode::BAD_REQUEST, "username already exists", Value::Null);
            }
            let mut user = user_json(3, body["username"].as_str().unwrap_or(""));
            user["email"] = body["email"].clone();
            user["full_name"] = body["full_name"].clone();
            user["user_group_id"] = body["user_group_id"].clone();
            envelope(StatusCode::OK, "create success", user)
        }
        (Method::PUT, ["users", _]) | (Method::PUT, ["user-groups", _]) => {
            envelope(StatusCode::OK, "update success", Value::Null)
        }
        (Method::DELETE, ["users", _]) | (Method::DELETE, ["user-groups", _]) => {
            envelope(StatusCode::OK, "delete success", Value::Null)
        }
        (Method::GET, ["user-groups"]) => envelope(
            StatusCode::OK,
            "get success",
            page(vec![group_json(1, "admins")], uri.query()),
        ),
        (Method::GET, ["user-groups", id]) => {
            let id = id.parse().unwrap_or(0);
            envelope(StatusCode::OK, "get success", group_json(id, "admins"))
        }
        (Method::POST, ["user-groups"]) => {
            let body = body.unwrap_or(Value::Null);
            let mut group = group_json(7, body["name"].as_str().unwrap_or(""));
            group["permissions"] = body["permissions"].clone();
            envelope(StatusCode::OK, "create success", group)
        }
        // Failure fixtures for the error path.
        (Method::GET, ["boom"]) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        (Method::GET, ["gateway"]) => {
            (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response()
        }
        (Method::GET, ["garbled"]) => (StatusCode::OK, "not json").into_response(),
        _ => envelope(StatusCode::NOT_FOUND, "not found", Value::Null),
    }
}
