//! Livry relay server binary

use clap::Parser;
use livry_core::{Hub, RelayConfig};
use livry_server::RelayServer;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Notification relay for the delivery-dispatch admin console.
#[derive(Parser, Debug)]
#[command(name = "livry-server", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:3001")]
    bind: String,

    /// Seconds between keep-alive frames on open streams
    #[arg(long, default_value_t = 15)]
    keep_alive_secs: u64,

    /// Per-subscriber outbound buffer, in records
    #[arg(long, default_value_t = 32)]
    channel_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,livry=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    let config = RelayConfig::new()
        .keep_alive_interval(Duration::from_secs(args.keep_alive_secs))
        .channel_capacity(args.channel_capacity);
    let hub = Arc::new(Hub::new());

    RelayServer::new(hub, config).run(&args.bind).await
}
