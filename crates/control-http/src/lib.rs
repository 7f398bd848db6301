//! HTTP control plane exposing a node's identity and peers.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;

pub use error::Error;

use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use baseswim_control::{ControlPlane, NodeStatus};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

/// Body of `GET /`.
#[derive(Debug, Serialize)]
struct StatusResponse {
    id: String,
    peers: Vec<String>,
}

/// Body of `GET /whoami`.
#[derive(Debug, Serialize)]
struct WhoamiResponse {
    id: String,
}

type SharedStatus = Arc<dyn NodeStatus>;

async fn status(State(node): State<SharedStatus>) -> Json<StatusResponse> {
    Json(StatusResponse {
        id: node.whoami(),
        peers: node.peers(),
    })
}

async fn whoami(State(node): State<SharedStatus>) -> Json<WhoamiResponse> {
    Json(WhoamiResponse { id: node.whoami() })
}

async fn peers(State(node): State<SharedStatus>) -> Json<Vec<String>> {
    Json(node.peers())
}

/// Control plane served over plain HTTP on all interfaces.
pub struct HttpControlPlane {
    node: SharedStatus,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl HttpControlPlane {
    /// Creates a control plane for `node`. Nothing is bound until `listen`.
    #[must_use]
    pub fn new(node: Arc<dyn NodeStatus>) -> Self {
        Self {
            node,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/", get(status))
            .route("/whoami", get(whoami))
            .route("/peers", get(peers))
            .with_state(self.node.clone())
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    type Error = Error;

    async fn listen(&self, port: u16) -> Result<u16, Self::Error> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        let listener = tokio::net::TcpListener::bind(listen_addr)
            .await
            .map_err(|source| Error::Bind { port, source })?;
        let bound_port = listener
            .local_addr()
            .map_err(|source| Error::Bind { port, source })?
            .port();

        let router = self.router();
        let shutdown_token = self.shutdown_token.clone();

        self.task_tracker.spawn(async move {
            tokio::select! {
                e = axum::serve(listener, router.into_make_service()).into_future() => {
                    info!("control plane exited {:?}", e);
                }
                () = shutdown_token.cancelled() => {}
            };
        });

        self.task_tracker.close();

        info!("control plane listening on port {}", bound_port);

        Ok(bound_port)
    }

    async fn close(&self) {
        info!("control plane shutting down...");

        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("control plane shutdown");
    }
}
