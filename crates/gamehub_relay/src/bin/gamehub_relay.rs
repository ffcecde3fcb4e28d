//! Relay server binary.
//!
//! ```text
//! gamehub_relay --config hub.toml --bind 127.0.0.1:3001
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gamehub_relay::{RelayHub, RelayResult, RelayServer};
use gamehub_shared::HubConfig;
use tracing_subscriber::EnvFilter;

/// Room relay for the party game hub.
#[derive(Parser, Debug)]
#[command(name = "gamehub_relay", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on; overrides `relay.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> RelayResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => HubConfig::load(path)?,
        None => HubConfig::default(),
    };
    let bind = args.bind.unwrap_or(config.relay.bind_address);

    let hub = Arc::new(RelayHub::new(config.relay.recent_interactions));
    RelayServer::bind(&bind, hub).await?.run().await
}
