use std::sync::Arc;

use crate::{
    error::ConsoleError,
    models::{CreateUserGroupRequest, ListParams, Page, UpdateUserGroupRequest, UserGroup},
    pipeline::RequestPipeline,
};

/// UserGroupsApi
///
/// CRUD over `/user-groups`. Same shape as [`crate::api::UsersApi`].
#[derive(Clone)]
pub struct UserGroupsApi {
    pipeline: Arc<RequestPipeline>,
}

impl UserGroupsApi {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page<UserGroup>, ConsoleError> {
        let body = self.pipeline.get("/user-groups", Some(params)).await?;
        RequestPipeline::data(body)
    }

    pub async fn get(&self, id: u32) -> Result<UserGroup, ConsoleError> {
        let body = self
            .pipeline
            .get::<()>(&format!("/user-groups/{id}"), None)
            .await?;
        RequestPipeline::data(body)
    }

    pub async fn create(&self, request: &CreateUserGroupRequest) -> Result<UserGroup, ConsoleError> {
        request.validate()?;
        let body = self.pipeline.post("/user-groups", request).await?;
        RequestPipeline::data(body)
    }

    pub async fn update(
        &self,
        id: u32,
        request: &UpdateUserGroupRequest,
    ) -> Result<String, ConsoleError> {
        request.validate()?;
        if request.is_empty() {
            return Err(ConsoleError::Validation(
                "update requires at least one field".to_string(),
            ));
        }
        let body = self
            .pipeline
            .put(&format!("/user-groups/{id}"), request)
            .await?;
        RequestPipeline::message(body)
    }

    pub async fn delete(&self, id: u32) -> Result<String, ConsoleError> {
        let body = self.pipeline.delete(&format!("/user-groups/{id}")).await?;
        RequestPipeline::message(body)
    }
}
