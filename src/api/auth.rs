use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::ConsoleError,
    models::{ApiResponse, LoginRequest, LoginResponse, LoginResult},
    pipeline::RequestPipeline,
    session::AuthGateway,
};

/// AuthApi
///
/// `POST /auth/login`. Does not update the session itself; the session store
/// drives it through [`AuthGateway`] and installs the result.
#[derive(Clone)]
pub struct AuthApi {
    pipeline: Arc<RequestPipeline>,
}

impl AuthApi {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResult, ConsoleError> {
        let body = self.pipeline.post("/auth/login", credentials).await?;
        let envelope = ApiResponse::<LoginResponse>::from_body(body)?;
        let message = envelope.message.clone();
        let LoginResponse { token, user } = envelope.into_data()?;
        Ok(LoginResult {
            token,
            user,
            message,
        })
    }
}

#[async_trait]
impl AuthGateway for AuthApi {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResult, ConsoleError> {
        AuthApi::login(self, credentials).await
    }
}
