use crate::bootstrap::BootState;
use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::event::{EventBus, NodeEvent};
use crate::identity::NodeIdentity;
use crate::net::{EphemeralUdpPorts, PortAllocator};
use crate::normalizer::EventNormalizer;

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use baseswim_control::{ControlPlane, NodeStatus};
use baseswim_control_http::HttpControlPlane;
use baseswim_membership::{MembershipFeeds, MembershipProvider};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

type ControlPlaneFactory<C> = Box<dyn Fn(NodeHandle) -> C + Send + Sync>;

/// Read-only view of a node handed to its control plane.
#[derive(Clone, Debug)]
pub struct NodeHandle {
    identity: NodeIdentity,
    peers: watch::Receiver<BTreeSet<String>>,
}

impl NodeHandle {
    /// Creates a handle over `identity` and a live peer snapshot.
    #[must_use]
    pub const fn new(identity: NodeIdentity, peers: watch::Receiver<BTreeSet<String>>) -> Self {
        Self { identity, peers }
    }

    /// The node's identity.
    #[must_use]
    pub const fn identity(&self) -> &NodeIdentity {
        &self.identity
    }
}

impl NodeStatus for NodeHandle {
    fn whoami(&self) -> String {
        self.identity.to_string()
    }

    fn peers(&self) -> Vec<String> {
        self.peers.borrow().iter().cloned().collect()
    }
}

/// A cluster member: membership provider, peer lifecycle and optional
/// control plane behind one handle.
///
/// Subscribe before calling [`start`](Self::start) to see every event.
pub struct BaseSwim<M, C = HttpControlPlane> {
    pub(crate) config: NodeConfig,
    pub(crate) membership: Arc<M>,
    pub(crate) control_factory: ControlPlaneFactory<C>,
    pub(crate) control_plane: Mutex<Option<Arc<C>>>,
    pub(crate) port_allocator: Box<dyn PortAllocator>,
    pub(crate) identity: OnceLock<NodeIdentity>,
    pub(crate) state: RwLock<BootState>,
    pub(crate) events: EventBus,
    pub(crate) normalizer: Mutex<Option<(EventNormalizer, MembershipFeeds)>>,
    pub(crate) peers: watch::Receiver<BTreeSet<String>>,
    pub(crate) shutdown_token: CancellationToken,
    pub(crate) task_tracker: TaskTracker,
}

impl<M> BaseSwim<M, HttpControlPlane>
where
    M: MembershipProvider,
{
    /// Creates a node that serves its control plane over HTTP.
    #[must_use]
    pub fn new(config: NodeConfig, membership: Arc<M>) -> Self {
        Self::with_control_plane(config, membership, |handle| {
            HttpControlPlane::new(Arc::new(handle))
        })
    }
}

impl<M, C> BaseSwim<M, C>
where
    M: MembershipProvider,
    C: ControlPlane,
{
    /// Creates a node whose control plane, if requested by `config`, is built
    /// by `factory` once the identity is known.
    ///
    /// The provider's feeds are subscribed here, so nothing the provider
    /// reports after construction is missed.
    pub fn with_control_plane<F>(config: NodeConfig, membership: Arc<M>, factory: F) -> Self
    where
        F: Fn(NodeHandle) -> C + Send + Sync + 'static,
    {
        let normalizer = EventNormalizer::new();
        let peers = normalizer.subscribe_peers();
        let feeds = membership.feeds();

        Self {
            config,
            membership,
            control_factory: Box::new(factory),
            control_plane: Mutex::new(None),
            port_allocator: Box::new(EphemeralUdpPorts),
            identity: OnceLock::new(),
            state: RwLock::new(BootState::Init),
            events: EventBus::new(),
            normalizer: Mutex::new(Some((normalizer, feeds))),
            peers,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Replaces where the gossip port comes from when `port` is unset.
    #[must_use]
    pub fn with_port_allocator(mut self, port_allocator: impl PortAllocator) -> Self {
        self.port_allocator = Box::new(port_allocator);
        self
    }

    /// Receives every event emitted from now on. Nothing is dropped however
    /// far the receiver falls behind.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NodeEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BootState {
        *self.state.read()
    }

    /// The resolved identity, once boot got that far.
    #[must_use]
    pub fn whoami(&self) -> Option<&NodeIdentity> {
        self.identity.get()
    }

    /// Peers currently believed alive, sorted.
    #[must_use]
    pub fn peers(&self) -> Vec<String> {
        self.peers.borrow().iter().cloned().collect()
    }

    /// The node's configuration.
    #[must_use]
    pub const fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The membership provider.
    #[must_use]
    pub const fn membership(&self) -> &Arc<M> {
        &self.membership
    }

    /// Closes the control plane, if any, then leaves the cluster.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotReady` unless the node is `Ready`, and
    /// `Error::Leave` if the provider failed to leave.
    pub async fn leave(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != BootState::Ready {
                return Err(Error::NotReady(*state));
            }
            *state = BootState::Left;
        }

        let control_plane = self.control_plane.lock().take();
        if let Some(control_plane) = control_plane {
            control_plane.close().await;
        }

        let result = self
            .membership
            .leave()
            .await
            .map_err(|e| Error::Leave(Arc::new(e)));

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("left cluster");

        result
    }
}

impl<M, C> Drop for BaseSwim<M, C> {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
