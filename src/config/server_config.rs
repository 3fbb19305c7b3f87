use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SessionConfig {
    /// Inactivity after which the operator has to sign in again, unset keeps it forever.
    pub ttl_secs: Option<u64>,
}

impl SessionConfig {
    pub fn ttl(&self) -> Option<std::time::Duration> {
        self.ttl_secs.map(std::time::Duration::from_secs)
    }
}
