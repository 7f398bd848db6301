//! Shared helpers for node integration tests.

#![allow(dead_code)]

use std::net::{Ipv4Addr, TcpListener};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use baseswim::{BaseSwim, NodeConfig, NodeEvent};
use baseswim_membership_memory::{MemoryCluster, MemoryMembership};
use tokio::sync::mpsc;

const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Next port to try, seeded into 15000-25000 so parallel test binaries
/// rarely collide.
static NEXT_PORT: LazyLock<Mutex<u16>> = LazyLock::new(|| {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    Mutex::new(15000 + u16::try_from(nanos % 10000).unwrap())
});

/// A TCP port nothing listens on right now.
pub fn allocate_port() -> u16 {
    let mut next = NEXT_PORT.lock().unwrap();

    for _ in 0..10000 {
        let port = *next;
        *next += 1;

        if TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).is_ok() {
            return port;
        }
    }

    panic!("no free port found below {}", *next);
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A config advertising `id` and joining through `seeds`.
pub fn node_config(id: &str, seeds: &[&str]) -> NodeConfig {
    NodeConfig {
        base: seeds.iter().map(ToString::to_string).collect(),
        ..NodeConfig::default()
    }
    .with_id(id)
}

pub fn memory_node(cluster: &MemoryCluster, config: NodeConfig) -> BaseSwim<MemoryMembership> {
    BaseSwim::new(config, Arc::new(MemoryMembership::new(cluster.clone())))
}

pub async fn next_event(events: &mut mpsc::UnboundedReceiver<NodeEvent>) -> NodeEvent {
    tokio::time::timeout(EVENT_WAIT, events.recv())
        .await
        .expect("timed out waiting for node event")
        .expect("event channel closed")
}

/// Skips events until one matches `predicate`.
pub async fn wait_for<F>(
    events: &mut mpsc::UnboundedReceiver<NodeEvent>,
    mut predicate: F,
) -> NodeEvent
where
    F: FnMut(&NodeEvent) -> bool,
{
    loop {
        let event = next_event(events).await;
        if predicate(&event) {
            return event;
        }
    }
}

pub fn is_peer_up(event: &NodeEvent, host: &str) -> bool {
    matches!(event, NodeEvent::PeerUp(e) if e.host == host)
}

pub fn is_peer_suspect(event: &NodeEvent, host: &str) -> bool {
    matches!(event, NodeEvent::PeerSuspect(e) if e.host == host)
}

pub fn is_peer_down(event: &NodeEvent, host: &str) -> bool {
    matches!(event, NodeEvent::PeerDown(e) if e.host == host)
}
