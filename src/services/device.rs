use crate::common::{ApiError, ApiResult};
use crate::gateways::{DeviceRepository, TelemetrySource};
use crate::models::{Device, DeviceDraft, DeviceProfile, ImportFile};
use crate::services::device_status::resolve_statuses;
use std::collections::HashMap;
use std::sync::Arc;

pub struct DeviceService {
    repo: Arc<dyn DeviceRepository>,
    telemetry: Arc<dyn TelemetrySource>,
    status_fallback: String,
}

impl DeviceService {
    pub fn new(
        repo: Arc<dyn DeviceRepository>,
        telemetry: Arc<dyn TelemetrySource>,
        status_fallback: String,
    ) -> Self {
        Self {
            repo,
            telemetry,
            status_fallback,
        }
    }

    /// Registry listing with sensor states resolved from telemetry.
    pub async fn list(&self) -> ApiResult<Vec<Device>> {
        let devices = self.repo.list().await?;
        Ok(resolve_statuses(self.telemetry.as_ref(), devices, &self.status_fallback).await)
    }

    /// Display name per device id, straight from the registry.
    pub async fn names(&self) -> ApiResult<HashMap<String, String>> {
        let devices = self.repo.list().await?;
        Ok(devices.into_iter().map(|it| (it.id, it.name)).collect())
    }

    pub async fn get(&self, id: &str) -> ApiResult<Device> {
        let device = self.repo.get(id).await?;
        let mut resolved =
            resolve_statuses(self.telemetry.as_ref(), vec![device], &self.status_fallback).await;
        resolved
            .pop()
            .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))
    }

    pub async fn profiles(&self) -> ApiResult<Vec<DeviceProfile>> {
        Ok(self.repo.profiles().await?)
    }

    pub async fn create(&self, draft: DeviceDraft) -> ApiResult<Vec<Device>> {
        draft.validate().map_err(ApiError::Validation)?;
        let device = self.repo.create(draft).await?;
        tracing::info!(device_id = %device.id, "Created device '{}'", device.name);
        self.list().await
    }

    pub async fn update(&self, id: &str, draft: DeviceDraft) -> ApiResult<Vec<Device>> {
        draft.validate().map_err(ApiError::Validation)?;
        self.repo.update(id, draft).await?;
        tracing::info!(device_id = %id, "Updated device");
        self.list().await
    }

    pub async fn delete(&self, id: &str) -> ApiResult<Vec<Device>> {
        self.repo.delete(id).await?;
        tracing::info!(device_id = %id, "Deleted device");
        self.list().await
    }

    pub async fn import(&self, file: ImportFile) -> ApiResult<Vec<Device>> {
        tracing::info!("Importing devices from '{}' ({} bytes)", file.file_name, file.bytes.len());
        self.repo.import(file).await?;
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::MemoryStore;

    fn service(store: Arc<MemoryStore>) -> DeviceService {
        DeviceService::new(store.clone(), store, "Unknown".to_string())
    }

    #[tokio::test]
    async fn created_device_is_listed_with_states() {
        let service = service(Arc::new(MemoryStore::new()));
        let devices = service
            .create(DeviceDraft {
                name: "Main Entrance".into(),
                r#type: "Fingerprint Scanner".into(),
                status: Some("closed".into()),
                cam_status: Some("inactive".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(devices.len(), 1);
        let device = &devices[0];
        assert_eq!((device.name.as_str(), device.r#type.as_str()), ("Main Entrance", "Fingerprint Scanner"));
        assert_eq!(device.location, "Unknown");
        assert_eq!(device.status, "Closed");
        assert_eq!(device.cam_status, "Inactive");
        assert_eq!(device.rfid_status, "Unknown");
    }

    #[tokio::test]
    async fn device_without_telemetry_uses_fallback() {
        let store = Arc::new(MemoryStore::new());
        let service = DeviceService::new(store.clone(), store, "N/A".to_string());
        let devices = service
            .create(DeviceDraft {
                name: "Back Door".into(),
                r#type: "RFID Reader".into(),
                location: Some("Parking".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let device = service.get(&devices[0].id).await.unwrap();
        assert_eq!(device.status, "N/A");
        assert_eq!(device.location, "Parking");
    }

    #[tokio::test]
    async fn rejects_blank_type() {
        let service = service(Arc::new(MemoryStore::new()));
        let err = service
            .create(DeviceDraft {
                name: "Gate".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'type' is required");
    }
}
