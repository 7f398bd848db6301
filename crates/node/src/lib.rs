//! A SWIM cluster member with a deduplicated peer lifecycle.
//!
//! A [`BaseSwim`] resolves the `host:port` it advertises, joins its cluster
//! through a [`MembershipProvider`], optionally starts a control plane, and
//! reports `PeerUp`, `PeerSuspect` and `PeerDown` exactly once per transition
//! however many times the provider repeats itself.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod bootstrap;
mod config;
mod error;
mod event;
mod identity;
mod net;
mod node;
mod normalizer;

pub use bootstrap::BootState;
pub use config::{
    ControlPlaneConfig, DEFAULT_CONTROL_PLANE_PORT, DEFAULT_INTERVAL_MS, DEFAULT_JOIN_TIMEOUT_MS,
    DEFAULT_PING_REQ_TIMEOUT_MS, DEFAULT_PING_TIMEOUT_MS, HttpSetting, LocalConfig, NodeConfig,
};
pub use error::{Error, Result};
pub use event::{EventBus, NodeEvent};
pub use identity::{NodeIdentity, resolve_identity};
pub use net::{EphemeralUdpPorts, PortAllocator, allocate_udp_port, detect_local_address};
pub use node::{BaseSwim, NodeHandle};
pub use normalizer::EventNormalizer;

pub use baseswim_membership::{
    Feed, JoinOptions, MemberState, MembershipEvent, MembershipFeeds, MembershipProvider,
};
