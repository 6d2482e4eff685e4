use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use ts_rs::TS;

use crate::error::ConsoleError;

// --- Resource Schemas (Returned by the API) ---

/// User
///
/// A console account as returned by `/users` and embedded in the login
/// response. Held by the session as the current user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: u32,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    // The HarborArk backend names these `group_id`, `group` and `is_enabled`.
    #[serde(alias = "group_id")]
    pub user_group_id: u32,
    // Present only when the server preloads the group.
    #[serde(default, alias = "group", skip_serializing_if = "Option::is_none")]
    pub user_group: Option<UserGroup>,
    #[serde(alias = "is_enabled")]
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UserGroup
///
/// A named permission set. Users reference exactly one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserGroup {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    // Serialized as a JSON array; duplicates collapse.
    #[serde(default)]
    #[ts(type = "Array<string>")]
    pub permissions: BTreeSet<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Response Envelope ---

/// ApiResponse
///
/// Every HarborArk body is wrapped in `{ code, message, data }`. `data` is
/// `null` for acknowledgements (update, delete) and for errors.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Parses an envelope out of a normalized response body.
    pub fn from_body(body: Value) -> Result<Self, ConsoleError> {
        serde_json::from_value(body).map_err(|e| ConsoleError::Decode(e.to_string()))
    }

    /// Returns `data`, treating its absence as a malformed response.
    pub fn into_data(self) -> Result<T, ConsoleError> {
        self.data
            .ok_or_else(|| ConsoleError::Decode("response envelope has no data".to_string()))
    }
}

/// Page
///
/// The `data` of every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

// --- Query Parameters ---

/// ListParams
///
/// Pagination for `GET /users` and `GET /user-groups`. Unset fields are left
/// out of the query string and the server applies its defaults (page 1,
/// 10 per page).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// The `data` of a successful login envelope.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// LoginResult
///
/// What the session store hands back to the caller after a login: the
/// envelope's message alongside the unwrapped token and profile.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
    pub message: String,
}

/// CreateUserRequest
///
/// Body of `POST /users`. All fields are required.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub user_group_id: u32,
}

impl CreateUserRequest {
    /// Checks the required fields before anything is sent.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)?;
        require_non_empty("full_name", &self.full_name)?;
        require_email(&self.email)?;
        if self.user_group_id == 0 {
            return Err(ConsoleError::Validation(
                "user_group_id is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// UpdateUserRequest
///
/// Partial update payload for `PUT /users/{id}`.
///
/// Unset fields are omitted from the JSON entirely (not sent as `null`), so
/// the server only touches what the caller provided.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_group_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.full_name.is_none()
            && self.user_group_id.is_none()
            && self.is_active.is_none()
    }
}

/// CreateUserGroupRequest
///
/// Body of `POST /user-groups`. Only `name` is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateUserGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[ts(type = "Array<string>")]
    pub permissions: BTreeSet<String>,
}

impl CreateUserGroupRequest {
    pub fn validate(&self) -> Result<(), ConsoleError> {
        require_non_empty("name", &self.name)
    }
}

/// UpdateUserGroupRequest
///
/// Partial update payload for `PUT /user-groups/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateUserGroupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "Array<string> | null")]
    pub permissions: Option<BTreeSet<String>>,
}

impl UpdateUserGroupRequest {
    pub fn validate(&self) -> Result<(), ConsoleError> {
        match &self.name {
            Some(name) => require_non_empty("name", name),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.permissions.is_none()
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConsoleError> {
    if value.trim().is_empty() {
        return Err(ConsoleError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), ConsoleError> {
    require_non_empty("email", value)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ConsoleError::Validation(format!(
            "email `{value}` is not a valid address"
        ))),
    }
}
