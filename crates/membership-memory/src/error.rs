use baseswim_membership::MembershipError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// This provider already joined a cluster.
    #[error("already joined as {0}")]
    AlreadyJoined(String),

    /// Another member already uses the address.
    #[error("host {0} is already a member")]
    DuplicateHost(String),

    /// The provider has not joined a cluster.
    #[error("not joined")]
    NotJoined,

    /// None of the seeds is a member of the cluster.
    #[error("no seed reachable: {0:?}")]
    UnreachableSeeds(Vec<String>),
}

impl MembershipError for Error {}
