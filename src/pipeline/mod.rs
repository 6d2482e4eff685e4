//! Request pipeline.
//!
//! Every API call goes through [`RequestPipeline::send`]: the fixed headers
//! are applied, the middleware chain gets to adjust the outgoing request,
//! the request is sent, and the response is either normalized to its JSON
//! body or turned into a [`ResponseFailure`] that the chain observes before
//! the caller receives a [`ConsoleError`].

use std::{sync::Arc, time::Instant};

use reqwest::{
    Method, StatusCode,
    header::{ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::Instrument;

use crate::{config::ConsoleConfig, error::ConsoleError, models::ApiResponse};

pub mod middleware;

pub use middleware::{
    BearerAuth, ErrorNotice, Middleware, REQUEST_ID_HEADER, RequestId, SessionExpiry,
};

/// Notice shown when the server rejects the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in again";
/// Notice shown when a failure carries no usable message.
pub const NETWORK_FAILURE_MESSAGE: &str = "network request failed";

/// OutgoingRequest
///
/// The request as the middleware chain sees it, before it is handed to the
/// HTTP client. `path` is relative to the API base address.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// ResponseFailure
///
/// A failed call as the middleware chain sees it. `status` is `None` when the
/// request never produced a response (connect error, timeout).
#[derive(Debug, Clone)]
pub struct ResponseFailure {
    pub method: Method,
    pub path: String,
    pub status: Option<StatusCode>,
    // The `message` field of the error body, when present and non-empty.
    pub message: Option<String>,
    // Transport-level description, for logs.
    pub detail: String,
}

impl ResponseFailure {
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }

    /// Classifies the failure into the console's error taxonomy.
    pub fn into_error(self) -> ConsoleError {
        if self.is_unauthorized() {
            return ConsoleError::Unauthorized;
        }
        match (self.status, self.message) {
            (Some(status), _) if status.is_success() => ConsoleError::Decode(self.detail),
            (Some(status), Some(message)) => ConsoleError::Api {
                status: status.as_u16(),
                message,
            },
            _ => ConsoleError::Network(self.detail),
        }
    }
}

/// RequestPipeline
///
/// The shared HTTP client configuration plus the ordered middleware chain.
/// Built once per console context and shared by every API client.
pub struct RequestPipeline {
    http: reqwest::Client,
    base_url: String,
    fixed_headers: HeaderMap,
    chain: Vec<Arc<dyn Middleware>>,
}

impl RequestPipeline {
    /// Builds a pipeline with an empty middleware chain.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConsoleError::Config(format!("http client build failed: {e}")))?;

        let mut fixed_headers = HeaderMap::new();
        fixed_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        fixed_headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.locale).map_err(|_| {
                ConsoleError::Config(format!("locale `{}` is not a valid header", config.locale))
            })?,
        );

        Ok(Self {
            http,
            base_url: config.base_url(),
            fixed_headers,
            chain: Vec::new(),
        })
    }

    /// Appends a middleware. Hooks run in the order middleware were added.
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.chain.push(middleware);
        self
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|m| m.name()).collect()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// send
    ///
    /// Issues one request and returns the parsed JSON body. An empty success
    /// body yields `Value::Null`. Failures run every middleware's failure
    /// hook before the classified error is returned. That includes a request
    /// rejected by a `before_send` hook: it is never sent, the hooks see it
    /// with no status and the rejection as its message, and the caller gets
    /// the hook's own error.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: Option<Value>,
    ) -> Result<Value, ConsoleError> {
        let mut request = OutgoingRequest {
            method,
            path: path.to_string(),
            headers: self.fixed_headers.clone(),
            query: query.as_ref().map(query_pairs).unwrap_or_default(),
            body,
        };
        for middleware in &self.chain {
            if let Err(e) = middleware.before_send(&mut request) {
                // Never sent, but reported through the same hooks as any
                // other failure.
                let failure = ResponseFailure {
                    method: request.method.clone(),
                    path: request.path.clone(),
                    status: None,
                    message: Some(e.to_string()),
                    detail: format!("{} rejected the request", middleware.name()),
                };
                tracing::warn!(path = %failure.path, error = %e, "{}", failure.detail);
                for hook in &self.chain {
                    hook.after_failure(&failure);
                }
                return Err(e);
            }
        }

        let request_id = request
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let span = tracing::info_span!(
            "api_request",
            method = %request.method,
            path = %request.path,
            req_id = %request_id,
        );

        async move {
            match self.dispatch(request).await {
                Ok(body) => Ok(body),
                Err(failure) => {
                    tracing::warn!(
                        status = ?failure.status.map(|s| s.as_u16()),
                        detail = %failure.detail,
                        "request failed"
                    );
                    for middleware in &self.chain {
                        middleware.after_failure(&failure);
                    }
                    Err(failure.into_error())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, request: OutgoingRequest) -> Result<Value, ResponseFailure> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let transport_failure = |detail: String| ResponseFailure {
            method: request.method.clone(),
            path: request.path.clone(),
            status: None,
            message: None,
            detail,
        };

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| transport_failure(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_failure(e.to_string()))?;

        tracing::info!(
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ResponseFailure {
                method: request.method.clone(),
                path: request.path.clone(),
                status: Some(status),
                message: None,
                detail: format!("success body is not JSON: {e}"),
            });
        }

        Err(ResponseFailure {
            method: request.method.clone(),
            path: request.path.clone(),
            status: Some(status),
            message: error_message(&text),
            detail: format!("HTTP {status}"),
        })
    }

    // --- Convenience wrappers used by the API clients ---

    pub async fn get<Q: Serialize>(&self, path: &str, query: Option<&Q>) -> Result<Value, ConsoleError> {
        let query = query.map(to_value).transpose()?;
        self.send(Method::GET, path, None, query).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ConsoleError> {
        self.send(Method::POST, path, Some(to_value(body)?), None).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ConsoleError> {
        self.send(Method::PUT, path, Some(to_value(body)?), None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ConsoleError> {
        self.send(Method::DELETE, path, None, None).await
    }

    /// Unwraps the envelope of `body` and decodes its `data` as `T`.
    pub fn data<T: DeserializeOwned>(body: Value) -> Result<T, ConsoleError> {
        ApiResponse::<T>::from_body(body)?.into_data()
    }

    /// Returns the envelope's message for acknowledgement-only endpoints.
    pub fn message(body: Value) -> Result<String, ConsoleError> {
        if body.is_null() {
            return Ok(String::new());
        }
        Ok(ApiResponse::<Value>::from_body(body)?.message)
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ConsoleError> {
    serde_json::to_value(value).map_err(|e| ConsoleError::Validation(e.to_string()))
}

/// Flattens a JSON object into query pairs. Nulls are dropped; scalars are
/// rendered without quotes.
fn query_pairs(query: &Value) -> Vec<(String, String)> {
    let Some(object) = query.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

/// Extracts a non-empty `message` from an error body, if it is JSON and has one.
fn error_message(text: &str) -> Option<String> {
    serde_json::from_str::<Value>(text)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_pairs_skip_nulls_and_unquote_scalars() {
        let pairs = query_pairs(&json!({ "page": 2, "page_size": null, "q": "ops" }));
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "ops".to_string()),
            ]
        );
    }

    #[test]
    fn error_message_requires_non_empty_field() {
        assert_eq!(
            error_message(r#"{"code":400,"message":"用户名已存在","data":null}"#).as_deref(),
            Some("用户名已存在")
        );
        assert_eq!(error_message(r#"{"code":500,"message":""}"#), None);
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn failure_classification() {
        let base = ResponseFailure {
            method: Method::GET,
            path: "/users".to_string(),
            status: Some(StatusCode::UNAUTHORIZED),
            message: Some("token expired".to_string()),
            detail: "HTTP 401".to_string(),
        };
        assert!(matches!(base.clone().into_error(), ConsoleError::Unauthorized));

        let api = ResponseFailure {
            status: Some(StatusCode::BAD_REQUEST),
            ..base.clone()
        };
        assert!(matches!(
            api.into_error(),
            ConsoleError::Api { status: 400, message } if message == "token expired"
        ));

        let transport = ResponseFailure {
            status: None,
            message: None,
            detail: "connection refused".to_string(),
            ..base
        };
        assert!(matches!(transport.into_error(), ConsoleError::Network(d) if d == "connection refused"));
    }
}
