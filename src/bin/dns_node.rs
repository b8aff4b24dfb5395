//! DNS node binary

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonemesh::{ClusterConfig, NodeServer};

#[derive(Parser, Debug)]
#[command(name = "zonemesh-node")]
#[command(about = "zonemesh DNS node - owns and serves a set of domains")]
#[command(version)]
struct Args {
    /// Cluster configuration file (TOML or JSON)
    #[arg(short, long, default_value = "zonemesh.toml")]
    config: PathBuf,

    /// Data directory (overrides the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ClusterConfig::load(&args.config)?;
    if let Some(data_dir) = args.data_dir {
        config.node.data_dir = data_dir;
    }

    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting zonemesh DNS node {}", zonemesh::VERSION);
    tracing::info!("Config: {}", args.config.display());
    tracing::info!("Data directory: {}", config.node.data_dir.display());

    let server = match NodeServer::bootstrap(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Bootstrap failed: {}", e);
            return Err(e.into());
        }
    };

    server
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    Ok(())
}
