//! Inkwell Server
//!
//! Self-hosted API server for the Inkwell plugins resource.

use inkwell_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        config.port = port.parse()?;
    }
    if let Ok(dir) = std::env::var("INKWELL_PLUGINS_DIR") {
        config.plugins_dir = dir.into();
    }

    start_server(config).await
}
