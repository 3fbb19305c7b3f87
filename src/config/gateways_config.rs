use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeseries_limit")]
    pub timeseries_limit: u32,
}

fn default_page_size() -> u32 {
    100
}

fn default_timeseries_limit() -> u32 {
    1000
}

#[derive(Deserialize, Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GatewaysConfig {
    pub timeout_secs: u64,
    pub status_fallback: String,
}

impl Default for GatewaysConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            status_fallback: "Unknown".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MemoryConfig {
    /// JSON seed for the in-memory store.
    pub fixture: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthSource {
    #[default]
    Platform,
    Memory,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    #[default]
    Backend,
    Memory,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistrySource {
    #[default]
    Platform,
    Memory,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    #[default]
    Platform,
    Backend,
    Memory,
}

/// Which system owns each concern.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RoutingConfig {
    pub auth: AuthSource,
    pub users: RecordSource,
    pub devices: RegistrySource,
    pub permissions: RecordSource,
    pub user_history: HistorySource,
    pub device_telemetry: RegistrySource,
}

impl RoutingConfig {
    pub fn needs_platform(&self) -> bool {
        self.auth == AuthSource::Platform
            || self.devices == RegistrySource::Platform
            || self.device_telemetry == RegistrySource::Platform
            || self.user_history == HistorySource::Platform
    }

    pub fn needs_backend(&self) -> bool {
        self.users == RecordSource::Backend
            || self.permissions == RecordSource::Backend
            || self.user_history == HistorySource::Backend
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// User-side records without a device-side match are dropped.
    #[default]
    Inner,
    Left,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct HistoryConfig {
    pub join_mode: JoinMode,
    pub sort_by_timestamp: bool,
}
