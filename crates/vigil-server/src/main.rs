//! Vigil Server - Presence Discovery Coordinator
//!
//! Probes the multicast group on a fixed period, tracks agent liveness, and
//! reports the table after every cycle.

use std::net::Ipv4Addr;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vigil_core::{ProtocolConfig, UdpTransport};
use vigil_server::coordinator::Coordinator;
use vigil_server::report::ReportFormat;

#[derive(Parser)]
#[command(name = "vigil-server")]
#[command(about = "Presence discovery and liveness monitoring coordinator")]
struct Cli {
    /// Multicast group to announce on
    #[arg(long, env = "VIGIL_MULTICAST_GROUP", default_value = "239.255.1.1")]
    multicast_group: Ipv4Addr,

    /// UDP port shared by both roles
    #[arg(long, env = "VIGIL_PORT", default_value_t = 12345)]
    port: u16,

    /// Liveness timeout in seconds; also the cycle period
    #[arg(long, env = "VIGIL_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Status report output format
    #[arg(long, env = "VIGIL_REPORT_FORMAT", value_enum, default_value = "text")]
    report_format: ReportFormat,
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
        timeout: Duration::from_secs(cli.timeout_secs),
    };

    info!("Starting Vigil Server...");
    info!("Multicast group: {}", config.group_addr());
    info!("Liveness timeout: {:?}", config.timeout);

    let transport = UdpTransport::bind(config.port).await?;

    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    Coordinator::new(transport, config, cli.report_format, shutdown_rx)
        .run()
        .await
}
