//! The boot sequence: resolve identity, join, optionally start the control
//! plane, then announce `Up`.

use crate::error::{Error, Result};
use crate::event::NodeEvent;
use crate::identity::{NodeIdentity, resolve_identity};
use crate::node::{BaseSwim, NodeHandle};

use std::fmt;
use std::sync::Arc;

use baseswim_control::ControlPlane;
use baseswim_membership::MembershipProvider;
use tracing::{error, info, warn};

/// Where a node is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BootState {
    /// Created, `start` not called yet.
    Init,

    /// Working out the identity to advertise.
    ResolvingIdentity,

    /// Waiting for the membership provider to join the cluster.
    Joining,

    /// Joined; binding the control plane.
    StartingControlPlane,

    /// Joined and, if requested, serving the control plane.
    Ready,

    /// Boot failed. Terminal.
    Failed,

    /// Left the cluster after being ready. Terminal.
    Left,
}

impl BootState {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Left)
    }
}

impl fmt::Display for BootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ResolvingIdentity => "resolving identity",
            Self::Joining => "joining",
            Self::StartingControlPlane => "starting control plane",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Left => "left",
        };
        f.write_str(name)
    }
}

impl<M, C> BaseSwim<M, C>
where
    M: MembershipProvider,
    C: ControlPlane,
{
    /// Boots the node. Runs at most once per instance.
    ///
    /// On success `HttpReady` (when a control plane was requested) and then
    /// `Up` have been emitted. On failure the same error is emitted as
    /// `NodeEvent::Error` and returned, and the node is `Failed`.
    ///
    /// # Errors
    ///
    /// - `Error::AlreadyStarted` if the node left `Init` before; nothing is
    ///   emitted in that case.
    /// - `Error::AddressResolution` or `Error::PortAllocation` if no identity
    ///   could be determined.
    /// - `Error::BootstrapJoin` or `Error::JoinTimeout` if the join failed.
    /// - `Error::ControlPlaneListen` if the control plane could not bind.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != BootState::Init {
                return Err(Error::AlreadyStarted);
            }
            *state = BootState::ResolvingIdentity;
        }

        self.spawn_normalizer();

        match self.boot().await {
            Ok(()) => {
                self.set_state(BootState::Ready);
                info!("node {} is up", self.whoami().map_or("?", NodeIdentity::as_str));
                self.emit(NodeEvent::Up);
                Ok(())
            }
            Err(e) => {
                error!("boot failed: {}", e);
                self.set_state(BootState::Failed);
                self.emit(NodeEvent::Error(e.clone()));
                self.shutdown_token.cancel();
                Err(e)
            }
        }
    }

    async fn boot(&self) -> Result<()> {
        let resolved = resolve_identity(&self.config, self.port_allocator.as_ref()).await?;
        let identity = self.identity.get_or_init(|| resolved).clone();

        self.set_state(BootState::Joining);
        self.join(&identity).await?;

        if let Some(control_plane) = self.config.control_plane() {
            self.set_state(BootState::StartingControlPlane);
            self.start_control_plane(identity, control_plane.port)
                .await?;
        }

        Ok(())
    }

    async fn join(&self, identity: &NodeIdentity) -> Result<()> {
        let options = self.config.join_options(identity.as_str());
        let join_timeout = options.join_timeout;

        info!(
            "{} joining cluster via {} seed(s)",
            identity,
            options.seeds.len()
        );

        match tokio::time::timeout(join_timeout, self.membership.bootstrap(options)).await {
            Ok(Ok(())) => {
                info!("{} joined cluster", identity);
                Ok(())
            }
            Ok(Err(e)) => Err(Error::BootstrapJoin(Arc::new(e))),
            Err(_) => Err(Error::JoinTimeout(join_timeout)),
        }
    }

    async fn start_control_plane(&self, identity: NodeIdentity, port: u16) -> Result<()> {
        let handle = NodeHandle::new(identity, self.peers.clone());
        let control_plane = Arc::new((self.control_factory)(handle));

        match control_plane.listen(port).await {
            Ok(bound_port) => {
                *self.control_plane.lock() = Some(control_plane);
                self.emit(NodeEvent::HttpReady(bound_port));
                Ok(())
            }
            Err(e) => {
                self.unwind().await;
                Err(Error::ControlPlaneListen {
                    port,
                    source: Arc::new(e),
                })
            }
        }
    }

    // Leaves the cluster joined moments ago so a failed boot is not left
    // half-started.
    async fn unwind(&self) {
        if let Err(e) = self.membership.leave().await {
            warn!("failed to leave cluster while unwinding: {}", e);
        }
    }

    fn spawn_normalizer(&self) {
        let Some((normalizer, feeds)) = self.normalizer.lock().take() else {
            return;
        };

        self.task_tracker.spawn(normalizer.run(
            feeds,
            self.events.clone(),
            self.shutdown_token.clone(),
        ));
    }

    fn set_state(&self, state: BootState) {
        *self.state.write() = state;
    }

    fn emit(&self, event: NodeEvent) {
        self.events.emit(&event);
    }
}
