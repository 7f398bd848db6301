//! Serves the control plane on an ephemeral port and queries it over HTTP.

use std::sync::Arc;

use baseswim_control::{ControlPlane, NodeStatus};
use baseswim_control_http::{Error, HttpControlPlane};
use serde_json::{Value, json};

struct FixedStatus;

impl NodeStatus for FixedStatus {
    fn whoami(&self) -> String {
        "10.0.0.5:9000".to_string()
    }

    fn peers(&self) -> Vec<String> {
        vec!["10.0.0.1:9000".to_string(), "10.0.0.2:9000".to_string()]
    }
}

async fn get_json(port: u16, path: &str) -> Value {
    reqwest::get(format!("http://127.0.0.1:{port}{path}"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_routes_report_node_status() {
    let control_plane = HttpControlPlane::new(Arc::new(FixedStatus));
    let port = control_plane.listen(0).await.unwrap();
    assert_ne!(port, 0);

    assert_eq!(
        get_json(port, "/").await,
        json!({
            "id": "10.0.0.5:9000",
            "peers": ["10.0.0.1:9000", "10.0.0.2:9000"],
        })
    );
    assert_eq!(get_json(port, "/whoami").await, json!({ "id": "10.0.0.5:9000" }));
    assert_eq!(
        get_json(port, "/peers").await,
        json!(["10.0.0.1:9000", "10.0.0.2:9000"])
    );

    control_plane.close().await;

    assert!(
        reqwest::get(format!("http://127.0.0.1:{port}/"))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_listen_twice_is_rejected() {
    let control_plane = HttpControlPlane::new(Arc::new(FixedStatus));
    control_plane.listen(0).await.unwrap();

    assert!(matches!(
        control_plane.listen(0).await,
        Err(Error::AlreadyStarted)
    ));

    control_plane.close().await;
}

#[tokio::test]
async fn test_port_in_use() {
    let occupied = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let control_plane = HttpControlPlane::new(Arc::new(FixedStatus));

    match control_plane.listen(port).await {
        Err(Error::Bind { port: failed, .. }) => assert_eq!(failed, port),
        other => panic!("expected bind error, got {other:?}"),
    }
}
