use std::sync::Arc;

use crate::{
    error::ConsoleError,
    models::{CreateUserRequest, ListParams, Page, UpdateUserRequest, User},
    pipeline::RequestPipeline,
};

/// UsersApi
///
/// CRUD over `/users`.
#[derive(Clone)]
pub struct UsersApi {
    pipeline: Arc<RequestPipeline>,
}

impl UsersApi {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    /// GET /users?page=&page_size=
    pub async fn list(&self, params: &ListParams) -> Result<Page<User>, ConsoleError> {
        let body = self.pipeline.get("/users", Some(params)).await?;
        RequestPipeline::data(body)
    }

    /// GET /users/{id}
    pub async fn get(&self, id: u32) -> Result<User, ConsoleError> {
        let body = self.pipeline.get::<()>(&format!("/users/{id}"), None).await?;
        RequestPipeline::data(body)
    }

    /// POST /users
    ///
    /// Validated locally first; an invalid payload never reaches the server.
    pub async fn create(&self, request: &CreateUserRequest) -> Result<User, ConsoleError> {
        request.validate()?;
        let body = self.pipeline.post("/users", request).await?;
        RequestPipeline::data(body)
    }

    /// PUT /users/{id}
    ///
    /// Sends only the fields set on `request`. Returns the server's
    /// acknowledgement message.
    pub async fn update(&self, id: u32, request: &UpdateUserRequest) -> Result<String, ConsoleError> {
        request.validate()?;
        if request.is_empty() {
            return Err(ConsoleError::Validation(
                "update requires at least one field".to_string(),
            ));
        }
        let body = self.pipeline.put(&format!("/users/{id}"), request).await?;
        RequestPipeline::message(body)
    }

    /// DELETE /users/{id}
    pub async fn delete(&self, id: u32) -> Result<String, ConsoleError> {
        let body = self.pipeline.delete(&format!("/users/{id}")).await?;
        RequestPipeline::message(body)
    }
}
