//! Rewriting forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                   REWRITE PROXY                       │
//!   GET /proxy?url=…    │  ┌──────────┐   ┌──────────┐   ┌──────────────┐      │
//!   ────────────────────┼─▶│  target  │──▶│  fetch   │──▶│   classify   │──────┼──▶ upstream
//!                       │  │ validate │   │ (reqwest)│   │ html/text/bin│      │
//!                       │  └──────────┘   └──────────┘   └──────┬───────┘      │
//!                       │                                       ▼              │
//!   relayed response    │  ┌──────────┐   ┌──────────┐   ┌──────────────┐      │
//!   ◀───────────────────┼──│ response │◀──│ sanitize │◀──│ rewrite links│      │
//!                       │  └──────────┘   └──────────┘   └──────────────┘      │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_proxy::config::{apply_bind_override, load_config, ProxyConfig};
use rewrite_proxy::observability::{logging, metrics};
use rewrite_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forwarding proxy that rewrites HTML links back through itself", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        apply_bind_override(&mut config, bind)?;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!("rewrite-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        timeout_secs = config.upstream.timeout_secs,
        max_body_bytes = config.upstream.max_body_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
