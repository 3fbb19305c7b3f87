use crate::config::{
    AuthSource, Config, HistorySource, RecordSource, RegistrySource,
};
use crate::gateways::http::build_client;
use crate::gateways::{
    Authenticator, BackendClient, DeviceRepository, MemoryStore, PermissionRepository,
    PlatformClient, TelemetrySource, UserHistorySource, UserRepository,
};
use crate::services::{
    AuthService, DeviceService, HistoryService, PermissionService, SessionStore, UserService,
};
use crate::utils::RequestFence;
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub devices: Arc<DeviceService>,
    pub permissions: Arc<PermissionService>,
    pub history: Arc<HistoryService>,
    pub fence: Arc<RequestFence>,
}

/// Gateways a deployment may route to, created only when something is routed there.
struct Upstreams {
    platform: Option<Arc<PlatformClient>>,
    backend: Option<Arc<BackendClient>>,
    memory: Arc<MemoryStore>,
}

impl Upstreams {
    fn platform(&self) -> anyhow::Result<Arc<PlatformClient>> {
        self.platform
            .clone()
            .ok_or_else(|| anyhow!("The platform gateway is not configured"))
    }

    fn backend(&self) -> anyhow::Result<Arc<BackendClient>> {
        self.backend
            .clone()
            .ok_or_else(|| anyhow!("The backend gateway is not configured"))
    }
}

impl AppState {
    pub fn build(config: &Config) -> anyhow::Result<AppState> {
        let session = Arc::new(SessionStore::new(config.session.ttl()));
        let http = build_client(Duration::from_secs(config.gateways.timeout_secs))?;
        let memory = match &config.memory.fixture {
            Some(path) => Arc::new(MemoryStore::load(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let upstreams = Upstreams {
            platform: config.platform.as_ref().map(|platform| {
                Arc::new(PlatformClient::new(
                    platform,
                    http.clone(),
                    session.clone(),
                    &config.gateways.status_fallback,
                ))
            }),
            backend: config
                .backend
                .as_ref()
                .map(|backend| Arc::new(BackendClient::new(backend, http.clone(), session.clone()))),
            memory,
        };
        let routing = &config.routing;

        let authenticator: Arc<dyn Authenticator> = match routing.auth {
            AuthSource::Platform => upstreams.platform()?,
            AuthSource::Memory => upstreams.memory.clone(),
        };
        let users: Arc<dyn UserRepository> = match routing.users {
            RecordSource::Backend => upstreams.backend()?,
            RecordSource::Memory => upstreams.memory.clone(),
        };
        let devices: Arc<dyn DeviceRepository> = match routing.devices {
            RegistrySource::Platform => upstreams.platform()?,
            RegistrySource::Memory => upstreams.memory.clone(),
        };
        let permissions: Arc<dyn PermissionRepository> = match routing.permissions {
            RecordSource::Backend => upstreams.backend()?,
            RecordSource::Memory => upstreams.memory.clone(),
        };
        let user_history: Arc<dyn UserHistorySource> = match routing.user_history {
            HistorySource::Platform => upstreams.platform()?,
            HistorySource::Backend => upstreams.backend()?,
            HistorySource::Memory => upstreams.memory.clone(),
        };
        let telemetry: Arc<dyn TelemetrySource> = match routing.device_telemetry {
            RegistrySource::Platform => upstreams.platform()?,
            RegistrySource::Memory => upstreams.memory.clone(),
        };
        tracing::info!("Gateway routing: {:?}", routing);

        Ok(AppState {
            auth: Arc::new(AuthService::new(authenticator, session)),
            users: Arc::new(UserService::new(users)),
            devices: Arc::new(DeviceService::new(
                devices,
                telemetry.clone(),
                config.gateways.status_fallback.clone(),
            )),
            permissions: Arc::new(PermissionService::new(permissions)),
            history: Arc::new(HistoryService::new(
                user_history,
                telemetry,
                config.history.join_mode,
                config.history.sort_by_timestamp,
            )),
            fence: Arc::new(RequestFence::new()),
        })
    }

    /// Every concern served by one in-memory store.
    #[cfg(test)]
    pub(crate) fn in_memory(store: Arc<MemoryStore>, history: &crate::config::HistoryConfig) -> AppState {
        let session = Arc::new(SessionStore::new(None));
        AppState {
            auth: Arc::new(AuthService::new(store.clone(), session)),
            users: Arc::new(UserService::new(store.clone())),
            devices: Arc::new(DeviceService::new(
                store.clone(),
                store.clone(),
                "Unknown".to_string(),
            )),
            permissions: Arc::new(PermissionService::new(store.clone())),
            history: Arc::new(HistoryService::new(
                store.clone(),
                store,
                history.join_mode,
                history.sort_by_timestamp,
            )),
            fence: Arc::new(RequestFence::new()),
        }
    }
}
