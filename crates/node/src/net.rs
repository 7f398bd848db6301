use crate::error::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::debug;

// Connecting a UDP socket only performs a route lookup; nothing is sent.
const ROUTE_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

/// The address this machine routes outbound traffic from.
///
/// Falls back to `127.0.0.1` on hosts without a usable route.
#[must_use]
pub fn detect_local_address() -> IpAddr {
    match probe_local_interface() {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            debug!("local address detection failed, using loopback: {}", e);
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_local_interface() -> std::io::Result<IpAddr> {
    let socket = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_PROBE_TARGET)?;
    Ok(socket.local_addr()?.ip())
}

/// Asks the OS for a UDP port that is free right now.
///
/// # Errors
///
/// Returns `Error::PortAllocation` if no socket could be bound.
pub async fn allocate_udp_port() -> Result<u16> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(|e| Error::PortAllocation(Arc::new(e)))?;

    let port = socket
        .local_addr()
        .map_err(|e| Error::PortAllocation(Arc::new(e)))?
        .port();

    debug!("allocated ephemeral udp port {}", port);

    Ok(port)
}

/// Source of the gossip port when none is configured.
#[async_trait]
pub trait PortAllocator: Send + Sync + 'static {
    /// Returns a port nothing is bound to right now.
    async fn allocate(&self) -> Result<u16>;
}

/// Ports handed out by the OS, see [`allocate_udp_port`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EphemeralUdpPorts;

#[async_trait]
impl PortAllocator for EphemeralUdpPorts {
    async fn allocate(&self) -> Result<u16> {
        allocate_udp_port().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_address_is_ipv4_and_specified() {
        let ip = detect_local_address();
        assert!(ip.is_ipv4());
        assert!(!ip.is_unspecified());
    }

    #[tokio::test]
    async fn test_allocated_port_is_nonzero() {
        assert_ne!(allocate_udp_port().await.unwrap(), 0);
        assert_ne!(EphemeralUdpPorts.allocate().await.unwrap(), 0);
    }
}
