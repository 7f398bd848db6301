use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Liveness of a member as seen by the failure detector.
///
/// Encoded as an integer on the wire: `Alive = 0`, `Suspect = 1`, `Faulty = 2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum MemberState {
    /// The member answers probes.
    Alive = 0,

    /// The member missed a probe and may be down.
    Suspect = 1,

    /// The member is considered down until it rejoins.
    Faulty = 2,
}

impl From<MemberState> for u8 {
    fn from(state: MemberState) -> Self {
        state as Self
    }
}

/// Returned when decoding an unknown state value.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("invalid member state: {0}")]
pub struct InvalidMemberState(pub u8);

impl TryFrom<u8> for MemberState {
    type Error = InvalidMemberState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Alive),
            1 => Ok(Self::Suspect),
            2 => Ok(Self::Faulty),
            other => Err(InvalidMemberState(other)),
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => f.write_str("alive"),
            Self::Suspect => f.write_str("suspect"),
            Self::Faulty => f.write_str("faulty"),
        }
    }
}

/// A raw state transition reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipEvent {
    /// Address of the member the transition is about.
    pub host: String,

    /// The member's new state.
    pub state: MemberState,
}

impl MembershipEvent {
    /// Creates a new event.
    pub fn new(host: impl Into<String>, state: MemberState) -> Self {
        Self {
            host: host.into(),
            state,
        }
    }

    /// Shorthand for an `Alive` transition.
    pub fn alive(host: impl Into<String>) -> Self {
        Self::new(host, MemberState::Alive)
    }

    /// Shorthand for a `Suspect` transition.
    pub fn suspect(host: impl Into<String>) -> Self {
        Self::new(host, MemberState::Suspect)
    }

    /// Shorthand for a `Faulty` transition.
    pub fn faulty(host: impl Into<String>) -> Self {
        Self::new(host, MemberState::Faulty)
    }
}

/// Which raw feed an event arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feed {
    /// The `change` feed.
    Change,

    /// The `update` feed.
    Update,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Change => f.write_str("change"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// Receivers for both raw feeds of one provider.
///
/// Feeds are unbounded: a provider never drops a transition because its
/// consumer fell behind.
#[derive(Debug)]
pub struct MembershipFeeds {
    /// The `change` feed.
    pub change: mpsc::UnboundedReceiver<MembershipEvent>,

    /// The `update` feed.
    pub update: mpsc::UnboundedReceiver<MembershipEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_encoding() {
        assert_eq!(u8::from(MemberState::Alive), 0);
        assert_eq!(u8::from(MemberState::Suspect), 1);
        assert_eq!(u8::from(MemberState::Faulty), 2);

        assert_eq!(MemberState::try_from(2), Ok(MemberState::Faulty));
        assert_eq!(MemberState::try_from(3), Err(InvalidMemberState(3)));
    }

    #[test]
    fn test_event_serializes_state_as_integer() {
        let event = MembershipEvent::suspect("10.0.0.1:9000");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"host":"10.0.0.1:9000","state":1}"#);

        let decoded: MembershipEvent =
            serde_json::from_str(r#"{"host":"a","state":0}"#).unwrap();
        assert_eq!(decoded, MembershipEvent::alive("a"));

        assert!(serde_json::from_str::<MembershipEvent>(r#"{"host":"a","state":7}"#).is_err());
    }
}
