//! Turns the provider's two raw feeds into one deduplicated peer lifecycle.
//!
//! | feed   | state           | outcome                                   |
//! |--------|-----------------|-------------------------------------------|
//! | change | Alive           | `PeerUp` if the host was not tracked      |
//! | change | Suspect, Faulty | nothing                                   |
//! | update | Alive           | `PeerUp` if the host was not tracked      |
//! | update | Suspect         | `PeerSuspect`, every time                 |
//! | update | Faulty          | untrack the host, `PeerDown` every time   |
//!
//! The provider reports first contact on `change` and suspicion, failure and
//! re-confirmation on `update`, and may report the same `Alive` on both.

use crate::event::{EventBus, NodeEvent};

use std::collections::BTreeSet;

use baseswim_membership::{Feed, MemberState, MembershipEvent, MembershipFeeds};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sole owner and writer of the set of peers believed alive.
#[derive(Debug)]
pub struct EventNormalizer {
    peers: watch::Sender<BTreeSet<String>>,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventNormalizer {
    /// Creates a normalizer tracking no peers.
    #[must_use]
    pub fn new() -> Self {
        let (peers, _) = watch::channel(BTreeSet::new());
        Self { peers }
    }

    /// A read-only view of the peer set that follows every change.
    #[must_use]
    pub fn subscribe_peers(&self) -> watch::Receiver<BTreeSet<String>> {
        self.peers.subscribe()
    }

    /// Whether `host` is currently tracked as alive.
    #[must_use]
    pub fn is_tracked(&self, host: &str) -> bool {
        self.peers.borrow().contains(host)
    }

    /// Snapshot of the tracked peers.
    #[must_use]
    pub fn peers(&self) -> BTreeSet<String> {
        self.peers.borrow().clone()
    }

    /// Applies one raw transition and returns the lifecycle event it produces.
    pub fn process(&mut self, feed: Feed, event: MembershipEvent) -> Option<NodeEvent> {
        let outcome = match (feed, event.state) {
            (_, MemberState::Alive) => {
                let added = self
                    .peers
                    .send_if_modified(|peers| peers.insert(event.host.clone()));

                added.then(|| NodeEvent::PeerUp(event.clone()))
            }
            (Feed::Change, MemberState::Suspect | MemberState::Faulty) => None,
            (Feed::Update, MemberState::Suspect) => Some(NodeEvent::PeerSuspect(event.clone())),
            (Feed::Update, MemberState::Faulty) => {
                self.peers.send_if_modified(|peers| peers.remove(&event.host));

                Some(NodeEvent::PeerDown(event.clone()))
            }
        };

        debug!(
            feed = %feed,
            host = %event.host,
            state = %event.state,
            emitted = outcome.is_some(),
            "membership transition"
        );

        outcome
    }

    /// Pumps both feeds until they close or `shutdown_token` is cancelled,
    /// publishing lifecycle events on `events`. Every raw event is processed.
    pub async fn run(
        mut self,
        mut feeds: MembershipFeeds,
        events: EventBus,
        shutdown_token: CancellationToken,
    ) {
        let mut change_open = true;
        let mut update_open = true;

        while change_open || update_open {
            let (feed, received) = tokio::select! {
                () = shutdown_token.cancelled() => break,
                received = feeds.change.recv(), if change_open => (Feed::Change, received),
                received = feeds.update.recv(), if update_open => (Feed::Update, received),
            };

            match received {
                Some(event) => {
                    if let Some(node_event) = self.process(feed, event) {
                        events.emit(&node_event);
                    }
                }
                None => {
                    debug!("{} feed closed", feed);
                    match feed {
                        Feed::Change => change_open = false,
                        Feed::Update => update_open = false,
                    }
                }
            }
        }

        debug!("event normalizer stopped");
    }
}
