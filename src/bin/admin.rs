//! Interactive management client

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use zonemesh::client::{Command, USAGE};
use zonemesh::{ClusterConfig, Router};

#[derive(Parser, Debug)]
#[command(name = "zonemesh-admin")]
#[command(about = "zonemesh management client")]
#[command(version)]
struct Args {
    /// Cluster configuration file (TOML or JSON)
    #[arg(short, long, default_value = "zonemesh.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ClusterConfig::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .init();

    let mut router = Router::connect(&config.broker).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("-> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}\n{}", e, USAGE);
                continue;
            }
        };

        match router.execute(&command).await {
            Ok(clock) => println!("{} {}: ok - clock {}", command.verb(), command.target(), clock),
            Err(e) if e.is_fatal() => {
                tracing::error!("{} {} failed: {}", command.verb(), command.target(), e);
                return Err(e.into());
            }
            Err(e) => tracing::error!("{} {} failed: {}", command.verb(), command.target(), e),
        }
    }

    Ok(())
}
