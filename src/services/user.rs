use crate::common::{ApiError, ApiResult};
use crate::gateways::UserRepository;
use crate::models::{ImportFile, User, UserDraft, UserPatch};
use std::collections::HashMap;
use std::sync::Arc;

/// User flows; every mutation answers with the re-fetched list.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> ApiResult<Vec<User>> {
        Ok(self.repo.list().await?)
    }

    /// Display name per user id.
    pub async fn names(&self) -> ApiResult<HashMap<String, String>> {
        let users = self.repo.list().await?;
        Ok(users.into_iter().map(|it| (it.id, it.name)).collect())
    }

    pub async fn get(&self, id: &str) -> ApiResult<User> {
        Ok(self.repo.get(id).await?)
    }

    pub async fn create(&self, draft: UserDraft) -> ApiResult<Vec<User>> {
        draft.validate().map_err(ApiError::Validation)?;
        let user = self.repo.create(draft).await?;
        tracing::info!(user_id = %user.id, "Created user '{}'", user.username);
        self.list().await
    }

    pub async fn update(&self, id: &str, patch: UserPatch) -> ApiResult<Vec<User>> {
        patch.validate().map_err(ApiError::Validation)?;
        self.repo.update(id, patch).await?;
        tracing::info!(user_id = %id, "Updated user");
        self.list().await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<Vec<User>> {
        self.repo.delete(id).await?;
        tracing::info!(user_id = %id, "Deleted user");
        self.list().await
    }

    pub async fn import(&self, file: ImportFile) -> ApiResult<Vec<User>> {
        tracing::info!("Importing users from '{}' ({} bytes)", file.file_name, file.bytes.len());
        self.repo.import(file).await?;
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::MemoryStore;

    fn draft(id_number: &str) -> UserDraft {
        UserDraft {
            username: "john.doe".into(),
            name: "John Doe".into(),
            id_number: id_number.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_returns_refreshed_list() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        service.create(draft("ID001")).await.unwrap();
        let users = service.create(draft("ID002")).await.unwrap();
        let numbers: Vec<_> = users.iter().map(|it| it.id_number.as_str()).collect();
        assert_eq!(numbers, vec!["ID001", "ID002"]);
    }

    #[tokio::test]
    async fn blank_fields_never_reach_the_gateway() {
        let store = Arc::new(MemoryStore::new());
        let service = UserService::new(store.clone());
        let err = service.create(draft("  ")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(UserRepository::list(store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let service = UserService::new(Arc::new(MemoryStore::new()));
        let err = service.delete("nope").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
