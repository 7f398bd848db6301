//! Runs a single cluster member and logs its peer lifecycle.
//!
//! The member gossips over an in-memory cluster private to this process, so
//! it can only start a new cluster: any seed other than its own address is
//! reported as unreachable.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod args;
mod error;

use args::{Args, usage};
use error::Result;

use std::sync::Arc;

use baseswim::{BaseSwim, MembershipProvider, NodeEvent};
use baseswim_membership_memory::{MemoryCluster, MemoryMembership};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

async fn log_events<M: MembershipProvider>(
    node: Arc<BaseSwim<M>>,
    mut events: mpsc::UnboundedReceiver<NodeEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            NodeEvent::PeerUp(peer) => {
                info!(host = %peer.host, state = %peer.state, "peer online");
            }
            NodeEvent::PeerSuspect(peer) => {
                info!(host = %peer.host, state = %peer.state, "peer suspect");
            }
            NodeEvent::PeerDown(peer) => {
                info!(host = %peer.host, state = %peer.state, "peer offline");
            }
            NodeEvent::HttpReady(port) => {
                info!("http server listening on port {}", port);
            }
            NodeEvent::Up => {
                let id = node.whoami().map(ToString::to_string).unwrap_or_default();
                info!(id = %id, "I am up");
            }
            NodeEvent::Error(e) => {
                error!("{}", e);
            }
        }
    }
}

async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received interrupt signal");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if args.help {
        let bin = std::env::args().next().unwrap_or_else(|| "baseswim".to_string());
        eprintln!("{}", usage(&bin));
        std::process::exit(1);
    }

    let config = args.node_config()?;

    // Members share a cluster only within this process.
    let cluster = MemoryCluster::new();
    let node = Arc::new(BaseSwim::new(
        config,
        Arc::new(MemoryMembership::new(cluster)),
    ));

    let logger = tokio::spawn(log_events(node.clone(), node.subscribe()));

    node.start().await?;

    wait_for_shutdown_signal().await?;

    info!("Shutting down");
    node.leave().await?;
    logger.abort();

    Ok(())
}
