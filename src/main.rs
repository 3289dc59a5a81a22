//! artriddle - artistic riddle generator daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use artriddle::{Config, Server};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Artistic riddle generator daemon
#[derive(Parser, Debug)]
#[command(name = "artriddle", version, about = "Serve the artistic riddle generator")]
struct Args {
    /// TOML configuration file (optional)
    #[arg(short, long, default_value = "artriddle.toml")]
    config: PathBuf,

    /// Address to listen on, overrides the configuration
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// SQLite database file, overrides the configuration
    #[arg(short, long)]
    database: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "artriddle=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.db_path = Some(database);
    }

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
