use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Node error.
    #[error(transparent)]
    Node(#[from] baseswim::Error),

    /// Could not install a signal handler.
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),
}
