//! In-process implementation of membership for local development and tests.
//!
//! Every `MemoryMembership` attached to the same `MemoryCluster` sees the
//! others join, become suspect, fail and leave. There is no probing: the
//! cluster hub plays the failure detector and tests drive suspicion and
//! failure explicitly.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use baseswim_membership::{
    Feed, JoinOptions, MembershipEvent, MembershipFeeds, MembershipProvider,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug)]
struct Subscriber {
    change: mpsc::UnboundedSender<MembershipEvent>,
    update: mpsc::UnboundedSender<MembershipEvent>,
}

impl Subscriber {
    fn is_closed(&self) -> bool {
        self.change.is_closed() && self.update.is_closed()
    }
}

/// Fans the raw feeds of one member out to every `feeds()` caller.
#[derive(Clone, Debug, Default)]
struct FeedSenders {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl FeedSenders {
    fn subscribe(&self) -> MembershipFeeds {
        let (change_tx, change) = mpsc::unbounded_channel();
        let (update_tx, update) = mpsc::unbounded_channel();

        self.subscribers.lock().push(Subscriber {
            change: change_tx,
            update: update_tx,
        });

        MembershipFeeds { change, update }
    }

    fn send(&self, feed: Feed, event: &MembershipEvent) {
        let mut subscribers = self.subscribers.lock();

        for subscriber in subscribers.iter() {
            let sender = match feed {
                Feed::Change => &subscriber.change,
                Feed::Update => &subscriber.update,
            };
            let _ = sender.send(event.clone());
        }

        subscribers.retain(|subscriber| !subscriber.is_closed());
    }

    // The gossip library reports a newly seen member on both feeds.
    fn discovered(&self, host: &str) {
        let event = MembershipEvent::alive(host);
        self.send(Feed::Change, &event);
        self.send(Feed::Update, &event);
    }

    fn update(&self, event: &MembershipEvent) {
        self.send(Feed::Update, event);
    }
}

/// Shared hub that plays the role of the network between in-process members.
#[derive(Clone, Debug, Default)]
pub struct MemoryCluster {
    members: Arc<RwLock<HashMap<String, FeedSenders>>>,
}

impl MemoryCluster {
    /// Creates a new, empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses of the current members, sorted.
    #[must_use]
    pub fn members(&self) -> Vec<String> {
        let mut members: Vec<String> = self.members.read().keys().cloned().collect();
        members.sort();
        members
    }

    /// Whether `host` is currently a member.
    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.members.read().contains_key(host)
    }

    /// Tell every other member that `host` missed a probe.
    pub fn suspect(&self, host: &str) {
        debug!("suspecting {}", host);
        self.broadcast_update(host, &MembershipEvent::suspect(host));
    }

    /// Tell every other member that `host` refuted a suspicion.
    pub fn refute(&self, host: &str) {
        debug!("{} refuted suspicion", host);
        self.broadcast_update(host, &MembershipEvent::alive(host));
    }

    /// Drop `host` from the cluster without it leaving, as if it crashed.
    ///
    /// Returns `false` if `host` was not a member.
    pub fn fail(&self, host: &str) -> bool {
        if self.members.write().remove(host).is_none() {
            return false;
        }

        info!("{} declared faulty", host);
        self.broadcast_update(host, &MembershipEvent::faulty(host));

        true
    }

    fn broadcast_update(&self, about: &str, event: &MembershipEvent) {
        for (host, feeds) in self.members.read().iter() {
            if host != about {
                feeds.update(event);
            }
        }
    }
}

/// Membership provider backed by a [`MemoryCluster`].
#[derive(Debug)]
pub struct MemoryMembership {
    cluster: MemoryCluster,
    feeds: FeedSenders,
    local: RwLock<Option<String>>,
    last_join: RwLock<Option<JoinOptions>>,
}

impl MemoryMembership {
    /// Creates a provider that will join `cluster` when bootstrapped.
    #[must_use]
    pub fn new(cluster: MemoryCluster) -> Self {
        Self {
            cluster,
            feeds: FeedSenders::default(),
            local: RwLock::new(None),
            last_join: RwLock::new(None),
        }
    }

    /// The cluster this provider belongs to.
    #[must_use]
    pub const fn cluster(&self) -> &MemoryCluster {
        &self.cluster
    }

    /// The options of the most recent `bootstrap` call, successful or not.
    #[must_use]
    pub fn last_join(&self) -> Option<JoinOptions> {
        self.last_join.read().clone()
    }

    /// Publish a raw event on this provider's `change` feed.
    pub fn emit_change(&self, event: &MembershipEvent) {
        self.feeds.send(Feed::Change, event);
    }

    /// Publish a raw event on this provider's `update` feed.
    pub fn emit_update(&self, event: &MembershipEvent) {
        self.feeds.send(Feed::Update, event);
    }
}

#[async_trait]
impl MembershipProvider for MemoryMembership {
    type Error = Error;

    fn feeds(&self) -> MembershipFeeds {
        self.feeds.subscribe()
    }

    async fn bootstrap(&self, options: JoinOptions) -> Result<(), Self::Error> {
        *self.last_join.write() = Some(options.clone());

        let mut local = self.local.write();
        if let Some(host) = local.as_ref() {
            return Err(Error::AlreadyJoined(host.clone()));
        }

        let mut members = self.cluster.members.write();
        if members.contains_key(&options.local_host) {
            return Err(Error::DuplicateHost(options.local_host));
        }

        let seeds: Vec<&String> = options
            .seeds
            .iter()
            .filter(|seed| **seed != options.local_host)
            .collect();

        if !seeds.is_empty() && !seeds.iter().any(|seed| members.contains_key(*seed)) {
            return Err(Error::UnreachableSeeds(options.seeds));
        }

        for (host, feeds) in members.iter() {
            self.feeds.discovered(host);
            feeds.discovered(&options.local_host);
        }

        info!(
            "{} joined cluster of {} member(s)",
            options.local_host,
            members.len()
        );

        members.insert(options.local_host.clone(), self.feeds.clone());
        *local = Some(options.local_host);

        Ok(())
    }

    async fn leave(&self) -> Result<(), Self::Error> {
        let host = self.local.write().take().ok_or(Error::NotJoined)?;

        self.cluster.members.write().remove(&host);
        self.cluster
            .broadcast_update(&host, &MembershipEvent::faulty(&host));

        info!("{} left the cluster", host);

        Ok(())
    }

    fn whoami(&self) -> Option<String> {
        self.local.read().clone()
    }
}
