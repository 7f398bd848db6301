//! Resolution of the `host:port` identity a node advertises.

use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::net::{PortAllocator, detect_local_address};

use std::fmt;

use tracing::info;

/// The non-empty `host:port` this node advertises to its peers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Wraps an identity string.
    ///
    /// # Errors
    ///
    /// Returns `Error::AddressResolution` if `host` is empty or blank.
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::AddressResolution);
        }
        Ok(Self(host))
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NodeIdentity> for String {
    fn from(identity: NodeIdentity) -> Self {
        identity.0
    }
}

/// Determines the identity of a node, first match wins:
///
/// 1. `local.host`, verbatim
/// 2. `host` (or the detected address) joined with the configured `port`
/// 3. `host` (or the detected address) joined with a port from `ports`
///
/// # Errors
///
/// Returns `Error::PortAllocation` if step 3 cannot get a port, and
/// `Error::AddressResolution` if the result would be empty.
pub async fn resolve_identity(
    config: &NodeConfig,
    ports: &dyn PortAllocator,
) -> Result<NodeIdentity> {
    if let Some(local_host) = config.local_host() {
        return NodeIdentity::new(local_host);
    }

    let port = match config.gossip_port() {
        Some(port) => port,
        None => ports.allocate().await?,
    };

    let hostname = config
        .hostname()
        .map_or_else(|| detect_local_address().to_string(), ToString::to_string);

    let identity = NodeIdentity::new(format!("{hostname}:{port}"))?;
    info!("resolved identity {}", identity);

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalConfig;
    use crate::net::EphemeralUdpPorts;

    use std::io;
    use std::sync::Arc;

    use async_trait::async_trait;

    struct NoFreePorts;

    #[async_trait]
    impl PortAllocator for NoFreePorts {
        async fn allocate(&self) -> Result<u16> {
            Err(Error::PortAllocation(Arc::new(io::Error::new(
                io::ErrorKind::AddrInUse,
                "no free ports",
            ))))
        }
    }

    #[tokio::test]
    async fn test_local_host_wins() {
        let config = NodeConfig {
            local: LocalConfig {
                host: Some("X".to_string()),
            },
            host: Some("Y".to_string()),
            port: Some(9),
            ..NodeConfig::default()
        };

        assert_eq!(
            resolve_identity(&config, &EphemeralUdpPorts)
                .await
                .unwrap()
                .as_str(),
            "X"
        );
    }

    #[tokio::test]
    async fn test_host_and_port() {
        let config = NodeConfig {
            host: Some("node-a".to_string()),
            port: Some(9000),
            ..NodeConfig::default()
        };

        assert_eq!(
            resolve_identity(&config, &EphemeralUdpPorts).await.unwrap().as_str(),
            "node-a:9000"
        );
    }

    #[tokio::test]
    async fn test_port_with_detected_address() {
        let config = NodeConfig {
            port: Some(9000),
            ..NodeConfig::default()
        };

        assert_eq!(
            resolve_identity(&config, &EphemeralUdpPorts).await.unwrap().to_string(),
            format!("{}:9000", detect_local_address())
        );
    }

    #[tokio::test]
    async fn test_ephemeral_port() {
        let config = NodeConfig {
            host: Some("node-a".to_string()),
            ..NodeConfig::default()
        };

        let identity = resolve_identity(&config, &EphemeralUdpPorts)
            .await
            .unwrap();
        let (host, port) = identity.as_str().rsplit_once(':').unwrap();

        assert_eq!(host, "node-a");
        assert_ne!(port.parse::<u16>().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_configured_port_skips_allocation() {
        let config = NodeConfig {
            host: Some("node-a".to_string()),
            port: Some(9000),
            ..NodeConfig::default()
        };

        assert_eq!(
            resolve_identity(&config, &NoFreePorts).await.unwrap().as_str(),
            "node-a:9000"
        );
    }

    #[tokio::test]
    async fn test_allocation_failure() {
        let config = NodeConfig {
            host: Some("node-a".to_string()),
            ..NodeConfig::default()
        };

        assert!(matches!(
            resolve_identity(&config, &NoFreePorts).await,
            Err(Error::PortAllocation(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_local_host_falls_through() {
        let config = NodeConfig {
            local: LocalConfig {
                host: Some("  ".to_string()),
            },
            host: Some(" ".to_string()),
            port: Some(9),
            ..NodeConfig::default()
        };

        assert_eq!(
            resolve_identity(&config, &NoFreePorts).await.unwrap().to_string(),
            format!("{}:9", detect_local_address())
        );
    }

    #[test]
    fn test_empty_identity_is_rejected() {
        assert!(matches!(
            NodeIdentity::new(""),
            Err(Error::AddressResolution)
        ));
        assert!(matches!(
            NodeIdentity::new("  "),
            Err(Error::AddressResolution)
        ));
    }
}
