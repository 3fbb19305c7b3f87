use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod gateways_config;
mod logs_config;
mod server_config;

pub use gateways_config::*;
pub use logs_config::LogsConfig;
pub use server_config::{ServerConfig, SessionConfig};

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub platform: Option<PlatformConfig>,
    pub backend: Option<BackendConfig>,
    #[serde(default)]
    pub gateways: GatewaysConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    pub fn parse(content: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(content).with_context(|| {
            "Error: Failed to parse configuration file.\n\
        Please check the file syntax is valid TOML syntax"
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.routing.needs_platform() && self.platform.is_none() {
            return Err(anyhow!(
                "Error: [routing] sends requests to the platform but [platform] is not configured"
            ));
        }
        if self.routing.needs_backend() && self.backend.is_none() {
            return Err(anyhow!(
                "Error: [routing] sends requests to the backend but [backend] is not configured"
            ));
        }
        Ok(())
    }
}

fn parse_config_path(mut args: impl Iterator<Item = String>) -> anyhow::Result<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "-c" || arg == "--config" {
            return args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("Error: Please specify path string for -c argument."));
        }
    }
    Err(anyhow!(
        "Error: Please specify configuration file argument. Usage: -c <config_file>"
    ))
}

pub fn load_from(path: &Path) -> anyhow::Result<Config> {
    if !path.is_file() {
        return Err(anyhow!(
            "Error: Configuration file not found or invalid.\n\
        Please make sure that the configuration file exists and is a valid TOML file.\n\
        Expected file path: {:?}",
            path
        ));
    }
    let content = std::fs::read_to_string(path).with_context(|| {
        "Error: Failed to read configuration file.\n\
        Please check the file path and file permissions, and make sure the file is valid accessible"
    })?;
    Config::parse(&content)
}

pub fn load() -> anyhow::Result<Config> {
    let path = parse_config_path(std::env::args().skip(1))?;
    load_from(&path)
}
