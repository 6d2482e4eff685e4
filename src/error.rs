use reqwest::StatusCode;

/// ConsoleError
///
/// The single error taxonomy of the console. The pipeline maps every failed
/// response onto one of the first three variants; the rest are raised locally
/// before or after a request.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// HTTP 401. The session has already been cleared when this is returned.
    #[error("session expired, please log in again")]
    Unauthorized,

    /// The server rejected the request and said why.
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    /// Transport failure, timeout, or an error response without a message.
    #[error("network request failed: {0}")]
    Network(String),

    /// A success body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// A request payload failed client-side validation and was never sent.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Durable storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no route matches `{0}`")]
    RouteNotFound(String),

    #[error("too many redirects while navigating to `{0}`")]
    RedirectLoop(String),
}

impl ConsoleError {
    /// HTTP status attached to the error, when the server produced one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Api { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
