use crate::common::{ApiError, ApiResult};
use crate::gateways::PermissionRepository;
use crate::models::{Permission, PermissionDraft};
use std::sync::Arc;

pub struct PermissionService {
    repo: Arc<dyn PermissionRepository>,
}

impl PermissionService {
    pub fn new(repo: Arc<dyn PermissionRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> ApiResult<Vec<Permission>> {
        Ok(self.repo.list().await?)
    }

    pub async fn create(&self, draft: PermissionDraft) -> ApiResult<Vec<Permission>> {
        let window = draft.validate().map_err(ApiError::Validation)?;
        let permission = self.repo.create(draft, window).await?;
        tracing::info!(
            permission_id = %permission.id,
            "Granted {} user(s) access to {} device(s)",
            permission.user_ids.len(),
            permission.device_ids.len()
        );
        self.list().await
    }

    pub async fn update(&self, id: &str, draft: PermissionDraft) -> ApiResult<Vec<Permission>> {
        let window = draft.validate().map_err(ApiError::Validation)?;
        self.repo.update(id, draft, window).await?;
        tracing::info!(permission_id = %id, "Updated permission");
        self.list().await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<Vec<Permission>> {
        self.repo.delete(id).await?;
        tracing::info!(permission_id = %id, "Revoked permission");
        self.list().await
    }
}
