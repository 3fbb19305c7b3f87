use anyhow::Context;
use std::net::SocketAddr;
use tokio::net::TcpListener;

mod common;
mod config;
mod extractors;
mod gateways;
mod logging;
mod middlewares;
mod models;
mod routes;
mod server;
mod services;
mod state;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;
    logging::registry_logs(&config.logs)?;
    let config::ServerConfig { host, port } = config.server.clone();
    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve listen address {host}:{port}"))?
        .next()
        .with_context(|| format!("No address found for {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local: SocketAddr = listener.local_addr()?;
    tracing::info!("Listening on http://{}", local);
    server::run_until_done(&config, listener).await
}
