use crate::config::LogsConfig;
use crate::logging::format::Formatter;
use anyhow::Context;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::Level;
use tracing::Metadata;
use tracing_subscriber::Layer;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

mod format;

const CRATE_TARGET: &str = "accessdesk";

fn is_own(metadata: &Metadata<'_>) -> bool {
    metadata.target().starts_with(CRATE_TARGET)
}

pub fn registry_logs(config: &LogsConfig) -> anyhow::Result<()> {
    let level = config.level;
    let mut layers = Vec::new();
    match &config.file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|it| !it.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create logs directory {:?}", dir))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(Formatter::new(false))
                .with_writer(Mutex::new(file))
                .with_filter(filter::filter_fn(move |metadata| {
                    if is_own(metadata) {
                        metadata.level() <= &level
                    } else {
                        metadata.level() <= &Level::INFO
                    }
                }));
            layers.push(file_layer.boxed());
        }
        None => {
            let stdio_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(Formatter::new(true))
                .with_filter(filter::filter_fn(move |metadata| {
                    if is_own(metadata) {
                        metadata.level() <= &level
                    } else {
                        metadata.level() <= &Level::INFO
                    }
                }));
            layers.push(stdio_layer.boxed());
        }
    }
    tracing_subscriber::registry()
        .with(layers)
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .context("Failed to install the log subscriber")?;
    Ok(())
}
