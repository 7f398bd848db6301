//! Abstract interface for the administrative control plane of a node.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;

/// Marker trait for `ControlPlane` errors
pub trait ControlPlaneError: Debug + Error + Send + Sync + 'static {}

/// Read-only view of the node a control plane is bound to.
pub trait NodeStatus: Send + Sync + 'static {
    /// The identity the node advertises.
    fn whoami(&self) -> String;

    /// Peers currently believed alive, sorted.
    fn peers(&self) -> Vec<String>;
}

/// An administrative service started once the node has joined its cluster.
#[async_trait]
pub trait ControlPlane: Send + Sync + 'static {
    /// The error type returned by the control plane.
    type Error: ControlPlaneError;

    /// Start listening on `port`. Resolves once the socket is bound.
    ///
    /// Returns the port actually bound.
    async fn listen(&self, port: u16) -> Result<u16, Self::Error>;

    /// Stop serving and wait for in-flight work to finish.
    async fn close(&self);
}
