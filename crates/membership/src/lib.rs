//! Abstract interface for gossip-based membership providers.
//!
//! A provider runs the failure detector (probing, suspicion, dissemination) and
//! surfaces what it learns on two raw feeds:
//! - `change`: first contact with a member and other membership changes
//! - `update`: suspicion, failure and re-confirmation of members
//!
//! Consumers are expected to watch both feeds; neither one alone carries the
//! whole lifecycle of a peer.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod event;

pub use event::{Feed, InvalidMemberState, MemberState, MembershipEvent, MembershipFeeds};

use std::error::Error;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

/// Marker trait for `MembershipProvider` errors
pub trait MembershipError: Debug + Error + Send + Sync + 'static {}

/// Everything a provider needs to join a cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOptions {
    /// The `host:port` this node advertises to its peers.
    pub local_host: String,

    /// Seed addresses to contact, in order.
    pub seeds: Vec<String>,

    /// Give up joining after this long.
    pub join_timeout: Duration,

    /// Timeout for a direct probe.
    pub ping_timeout: Duration,

    /// Timeout for an indirect probe.
    pub ping_req_timeout: Duration,

    /// Protocol period.
    pub interval: Duration,
}

/// A gossip failure detector the node agent sits on top of.
#[async_trait]
pub trait MembershipProvider: Send + Sync + 'static {
    /// The error type returned by the provider.
    type Error: MembershipError;

    /// Subscribe to the raw `change` and `update` feeds.
    ///
    /// Only events published after the call are delivered.
    fn feeds(&self) -> MembershipFeeds;

    /// Join the cluster reachable through `options.seeds`.
    ///
    /// An empty seed list (or one naming only this node) starts a new cluster.
    async fn bootstrap(&self, options: JoinOptions) -> Result<(), Self::Error>;

    /// Leave the cluster.
    async fn leave(&self) -> Result<(), Self::Error>;

    /// The address this node is known by, once joined.
    fn whoami(&self) -> Option<String>;
}
