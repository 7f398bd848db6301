use baseswim_control::ControlPlaneError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The server has already been started.
    #[error("The server has already been started")]
    AlreadyStarted,

    /// Failed to bind to address.
    #[error("Failed to bind to port {port}: {source}")]
    Bind {
        /// The requested port.
        port: u16,

        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ControlPlaneError for Error {}
