use crate::error::Error;

use std::sync::Arc;

use baseswim_membership::MembershipEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Lifecycle notifications emitted by a node, in emission order.
#[derive(Clone, Debug)]
pub enum NodeEvent {
    /// A peer became alive, once per presence interval.
    PeerUp(MembershipEvent),

    /// A peer is suspected to be down. Repeated suspicion re-notifies.
    PeerSuspect(MembershipEvent),

    /// A peer was declared faulty.
    PeerDown(MembershipEvent),

    /// The control plane is listening on the given port.
    HttpReady(u16),

    /// The node joined its cluster and, if requested, its control plane is up.
    Up,

    /// Boot failed. No `Up` follows.
    Error(Error),
}

impl NodeEvent {
    /// The membership transition behind a peer event.
    #[must_use]
    pub const fn membership_event(&self) -> Option<&MembershipEvent> {
        match self {
            Self::PeerUp(event) | Self::PeerSuspect(event) | Self::PeerDown(event) => Some(event),
            Self::HttpReady(_) | Self::Up | Self::Error(_) => None,
        }
    }
}

/// Hands every emitted [`NodeEvent`] to every subscriber.
///
/// Each subscriber has its own unbounded queue, so a slow reader never
/// loses events and all readers see the same order.
#[derive(Clone, Debug, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<NodeEvent>>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receives every event emitted from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NodeEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Delivers `event` to all live subscribers and forgets dropped ones.
    pub fn emit(&self, event: &NodeEvent) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last emission.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_sees_every_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        for port in 0..3000 {
            bus.emit(&NodeEvent::HttpReady(port));
        }

        for port in 0..3000 {
            assert!(matches!(first.try_recv(), Ok(NodeEvent::HttpReady(p)) if p == port));
            assert!(matches!(second.try_recv(), Ok(NodeEvent::HttpReady(p)) if p == port));
        }
    }

    #[test]
    fn test_dropped_subscribers_are_forgotten() {
        let bus = EventBus::new();
        drop(bus.subscribe());
        let _kept = bus.subscribe();

        bus.emit(&NodeEvent::Up);

        assert_eq!(bus.subscriber_count(), 1);
    }
}
