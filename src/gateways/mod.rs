//! Adapters to the systems that own the data.
//!
//! Each concern is a trait so the deployment can route it to the platform, the
//! custom backend or the in-memory store independently.

pub mod backend;
mod error;
pub(crate) mod http;
pub mod memory;
pub mod platform;

pub use backend::BackendClient;
pub use error::{GatewayError, GatewayResult};
pub use memory::{MemoryFixture, MemoryStore, OperatorCredentials};
pub use platform::PlatformClient;

use crate::models::{
    Device, DeviceDraft, DeviceEvent, DeviceProfile, ImportFile, Permission, PermissionDraft,
    Profile, TimeWindow, User, UserDraft, UserEvent, UserPatch,
};
use async_trait::async_trait;

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchanges operator credentials for a bearer token and the operator profile.
    async fn login(&self, username: &str, password: &str) -> GatewayResult<(String, Profile)>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> GatewayResult<Vec<User>>;
    async fn get(&self, id: &str) -> GatewayResult<User>;
    async fn create(&self, draft: UserDraft) -> GatewayResult<User>;
    async fn update(&self, id: &str, patch: UserPatch) -> GatewayResult<User>;
    async fn delete(&self, id: &str) -> GatewayResult<()>;
    async fn import(&self, file: ImportFile) -> GatewayResult<()>;
}

/// Device registry, statuses returned here are not resolved yet.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn list(&self) -> GatewayResult<Vec<Device>>;
    async fn get(&self, id: &str) -> GatewayResult<Device>;
    async fn create(&self, draft: DeviceDraft) -> GatewayResult<Device>;
    async fn update(&self, id: &str, draft: DeviceDraft) -> GatewayResult<Device>;
    async fn delete(&self, id: &str) -> GatewayResult<()>;
    async fn profiles(&self) -> GatewayResult<Vec<DeviceProfile>>;
    async fn import(&self, file: ImportFile) -> GatewayResult<()>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn list(&self) -> GatewayResult<Vec<Permission>>;
    async fn create(&self, draft: PermissionDraft, window: TimeWindow) -> GatewayResult<Permission>;
    async fn update(
        &self,
        id: &str,
        draft: PermissionDraft,
        window: TimeWindow,
    ) -> GatewayResult<Permission>;
    async fn delete(&self, id: &str) -> GatewayResult<()>;
}

#[async_trait]
pub trait UserHistorySource: Send + Sync {
    async fn user_events(&self, user_id: &str, window: &TimeWindow) -> GatewayResult<Vec<UserEvent>>;
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Latest raw `status` payload of a device, `None` when it never reported one.
    async fn latest_status(&self, device_id: &str) -> GatewayResult<Option<serde_json::Value>>;

    async fn device_events(
        &self,
        device_id: &str,
        window: &TimeWindow,
    ) -> GatewayResult<Vec<DeviceEvent>>;
}
