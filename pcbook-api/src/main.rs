use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pcbook_api::PcbookServer;
use pcbook_core::config::Config;
use pcbook_core::logging::{init_logging_with_config, LogConfig};
use pcbook_core::metrics::init_metrics;
use tracing::info;

/// PCBook laptop catalog gRPC server
#[derive(Parser, Debug)]
#[command(name = "pcbook-server", version, about)]
struct Args {
    /// Port to listen on (overrides the configured bind address port)
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file; environment variables still apply on top
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("cannot load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(port) = args.port {
        config.server.bind_address.set_port(port);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::try_from(&config.logging)?)?;
    if config.metrics.enabled {
        init_metrics();
    }

    let server = PcbookServer::from_config(&config).await?;
    let addr = config.server.bind_address;
    info!(%addr, image_dir = %config.storage.image_dir.display(), "pcbook server configured");

    server
        .serve(addr, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await?;

    info!("server stopped");
    Ok(())
}
