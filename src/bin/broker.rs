//! Broker binary

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonemesh::{ClusterConfig, RoutingDirectory};

#[derive(Parser, Debug)]
#[command(name = "zonemesh-broker")]
#[command(about = "zonemesh broker - assigns DNS nodes to new domains")]
#[command(version)]
struct Args {
    /// Cluster configuration file (TOML or JSON)
    #[arg(short, long, default_value = "zonemesh.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ClusterConfig::load(&args.config)?;

    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    RoutingDirectory::new(config)
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
        })
        .await?;

    Ok(())
}
