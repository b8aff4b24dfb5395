//! Broker server

use crate::broker::grpc::BrokerGrpcService;
use crate::common::{ClusterConfig, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

/// Routing directory: assigns DNS nodes to domains a client has not seen.
pub struct RoutingDirectory {
    config: ClusterConfig,
}

impl RoutingDirectory {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let listener = TcpListener::bind(self.config.broker.socket_addr()).await?;
        self.serve_with_listener(listener, shutdown).await
    }

    pub async fn serve_with_listener(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        tracing::info!("Starting broker: {}", self.config.broker.id);
        tracing::info!("  gRPC API: {}", listener.local_addr()?);
        tracing::info!("  Replicas: {}", self.config.dns.len());
        tracing::info!("  Policy: {:?}", self.config.broker_policy);

        let service = BrokerGrpcService::new(
            self.config.dns,
            self.config.broker_policy,
            self.config.node.probe_timeout(),
        );
        tonic::transport::Server::builder()
            .add_service(service.into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await?;

        tracing::info!("Broker stopped");
        Ok(())
    }
}
