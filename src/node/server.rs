//! DNS node server

use crate::common::{ClusterConfig, NodeIdentity, Result};
use crate::node::bootstrap::{adopt_identity, local_addresses};
use crate::node::grpc::NodeGrpcService;
use crate::node::zone::ZoneStore;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

pub struct NodeServer {
    store: Arc<ZoneStore>,
    peers: Vec<NodeIdentity>,
}

impl NodeServer {
    pub fn new(store: Arc<ZoneStore>) -> Self {
        Self {
            store,
            peers: Vec::new(),
        }
    }

    /// Pick this process's identity from the cluster topology and open its
    /// zone store.
    pub async fn bootstrap(config: &ClusterConfig) -> Result<Self> {
        let local = local_addresses(&config.dns);
        tracing::info!(local = ?local, "local candidate addresses");

        let adoption =
            adopt_identity(&config.dns, &local, config.node.probe_timeout()).await?;
        let store = ZoneStore::open(
            adoption.identity,
            adoption.slot,
            config.replica_count(),
            &config.node,
        )?;

        Ok(Self {
            store: Arc::new(store),
            peers: adoption.peers,
        })
    }

    pub fn store(&self) -> Arc<ZoneStore> {
        self.store.clone()
    }

    pub fn peers(&self) -> &[NodeIdentity] {
        &self.peers
    }

    /// Listen on every interface at the adopted port until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let identity = self.store.identity();
        let unspecified = match identity.ip {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let listener = TcpListener::bind(SocketAddr::new(unspecified, identity.port)).await?;
        self.serve_with_listener(listener, shutdown).await
    }

    pub async fn serve_with_listener(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let identity = self.store.identity().clone();
        tracing::info!("Starting DNS node: {}", identity.id);
        tracing::info!("  Advertised: {}", identity.socket_addr());
        tracing::info!("  Listening: {}", listener.local_addr()?);
        tracing::info!("  Clock slot: {}", self.store.slot());
        tracing::info!("  Live peers: {}", self.peers.len());

        let service = NodeGrpcService::new(self.store);
        tonic::transport::Server::builder()
            .add_service(service.into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await?;

        tracing::info!("DNS node {} stopped", identity.id);
        Ok(())
    }
}
