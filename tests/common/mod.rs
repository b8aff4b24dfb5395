//! Shared helpers for integration tests.
//!
//! Nodes and brokers run in-process on ephemeral localhost ports. Listeners
//! are bound before the server task starts, so clients can connect as soon as
//! a helper returns.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use zonemesh::common::{
    BrokerConfig, BrokerPolicy, ClusterConfig, NodeIdentity, NodeSettings,
};
use zonemesh::node::{NodeServer, ZoneStore};
use zonemesh::RoutingDirectory;

/// A running in-process DNS node.
pub struct TestNode {
    pub identity: NodeIdentity,
    pub store: Arc<ZoneStore>,
    _data: TempDir,
    _shutdown: oneshot::Sender<()>,
}

/// A running in-process broker.
pub struct TestBroker {
    pub config: BrokerConfig,
    _shutdown: oneshot::Sender<()>,
}

pub async fn bind_local() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

/// A localhost port with nothing listening on it.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn identity(id: &str, port: u16) -> NodeIdentity {
    NodeIdentity {
        id: id.to_string(),
        ip: "127.0.0.1".parse().unwrap(),
        port,
    }
}

/// Start a DNS node with identity `id` at clock `slot` of `replicas`.
pub async fn spawn_node(id: &str, slot: usize, replicas: usize) -> TestNode {
    let listener = bind_local().await;
    let identity = identity(id, listener.local_addr().unwrap().port());

    let data = tempfile::tempdir().unwrap();
    let settings = NodeSettings {
        data_dir: data.path().to_path_buf(),
        ..Default::default()
    };
    let store = Arc::new(ZoneStore::open(identity.clone(), slot, replicas, &settings).unwrap());

    let (tx, rx) = oneshot::channel::<()>();
    let server = NodeServer::new(store.clone());
    tokio::spawn(async move {
        server
            .serve_with_listener(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    TestNode {
        identity,
        store,
        _data: data,
        _shutdown: tx,
    }
}

/// Cluster config for `replicas` with a broker at `broker_port`.
pub fn cluster_config(replicas: Vec<NodeIdentity>, broker_port: u16, policy: BrokerPolicy) -> ClusterConfig {
    ClusterConfig {
        dns: replicas,
        broker: BrokerConfig {
            id: "broker".into(),
            ip: "127.0.0.1".parse().unwrap(),
            port: broker_port,
        },
        node: NodeSettings {
            probe_timeout_ms: 500,
            ..Default::default()
        },
        broker_policy: policy,
        log_level: "debug".into(),
    }
}

/// Start a broker that hands out `replicas` according to `policy`.
pub async fn spawn_broker(replicas: Vec<NodeIdentity>, policy: BrokerPolicy) -> TestBroker {
    let listener = bind_local().await;
    let config = cluster_config(replicas, listener.local_addr().unwrap().port(), policy);
    let broker = config.broker.clone();

    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        RoutingDirectory::new(config)
            .serve_with_listener(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    TestBroker {
        config: broker,
        _shutdown: tx,
    }
}
