use crate::BootState;

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result type of node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while booting or stopping a node.
///
/// Cheap to clone so the same error can be returned and broadcast.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// No identity could be determined.
    #[error("missing id or local.host or port")]
    AddressResolution,

    /// The OS refused to hand out an ephemeral port.
    #[error("failed to allocate ephemeral port: {0}")]
    PortAllocation(#[source] Arc<std::io::Error>),

    /// The membership provider failed to join the cluster.
    #[error("failed to join cluster: {0}")]
    BootstrapJoin(#[source] Arc<dyn StdError + Send + Sync>),

    /// The membership provider did not finish joining within `joinTimeout`.
    #[error("timed out joining cluster after {0:?}")]
    JoinTimeout(Duration),

    /// The control plane could not bind its port.
    #[error("control plane failed to listen on port {port}: {source}")]
    ControlPlaneListen {
        /// The requested port.
        port: u16,

        /// The control plane's error.
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// The membership provider failed to leave the cluster.
    #[error("failed to leave cluster: {0}")]
    Leave(#[source] Arc<dyn StdError + Send + Sync>),

    /// `start` was called on a node that already started.
    #[error("already started")]
    AlreadyStarted,

    /// `leave` was called on a node that is not up.
    #[error("node is not ready (state: {0})")]
    NotReady(BootState),

    /// The configuration could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error belongs to a failed cluster join.
    #[must_use]
    pub const fn is_join_failure(&self) -> bool {
        matches!(self, Self::BootstrapJoin(_) | Self::JoinTimeout(_))
    }
}
