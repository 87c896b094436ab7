//! Vigil Agent - Passive Presence Responder
//!
//! Joins the discovery multicast group, answers liveness probes, and serves
//! descriptive metadata to the coordinator that probed it.

use std::net::Ipv4Addr;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vigil_agent::listener::Listener;
use vigil_agent::responder::Responder;
use vigil_core::{ProtocolConfig, UdpTransport};

#[derive(Parser)]
#[command(name = "vigil-agent")]
#[command(about = "Passive presence responder for vigil discovery")]
struct Cli {
    /// Multicast group to join
    #[arg(long, env = "VIGIL_MULTICAST_GROUP", default_value = "239.255.1.1")]
    multicast_group: Ipv4Addr,

    /// UDP port shared by both roles
    #[arg(long, env = "VIGIL_PORT", default_value_t = 12345)]
    port: u16,

    /// Descriptor reported to the coordinator (defaults to the hostname)
    #[arg(long, env = "VIGIL_DESCRIPTOR")]
    descriptor: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let config = ProtocolConfig {
        multicast_group: cli.multicast_group,
        port: cli.port,
        ..ProtocolConfig::default()
    };
    let descriptor = cli.descriptor.unwrap_or_else(default_descriptor);

    info!("Starting Vigil Agent...");
    info!("Multicast group: {}", config.group_addr());
    info!("Descriptor: {}", descriptor);

    let transport = UdpTransport::join_group(config.multicast_group, config.port).await?;

    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    Listener::new(transport, Responder::new(descriptor), shutdown_rx)
        .run()
        .await
}

/// `Hostname: <nodename>`, matching what coordinators display by default.
fn default_descriptor() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    format!("Hostname: {host}")
}
