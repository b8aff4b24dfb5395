//! DNS node gRPC service
//!
//! Thin adapter between the wire types and [`ZoneStore`]. Zone operations do
//! blocking file I/O and run on the blocking pool.

use crate::common::{QualifiedName, STATUS_OK};
use crate::node::zone::{UpdateOption, ZoneStore};
use crate::proto::dns_node_server::{DnsNode, DnsNodeServer};
use crate::proto::*;
use std::sync::Arc;
use tonic::{Request, Response, Status};

pub struct NodeGrpcService {
    store: Arc<ZoneStore>,
}

impl NodeGrpcService {
    pub fn new(store: Arc<ZoneStore>) -> Self {
        Self { store }
    }

    /// Converts this service into a gRPC server instance.
    pub fn into_server(self) -> DnsNodeServer<Self> {
        DnsNodeServer::new(self)
    }
}

#[tonic::async_trait]
impl DnsNode for NodeGrpcService {
    async fn status(&self, _req: Request<Empty>) -> Result<Response<StatusResponse>, Status> {
        Ok(Response::new(StatusResponse {
            status: STATUS_OK.to_string(),
        }))
    }

    async fn create(
        &self,
        req: Request<CreateRequest>,
    ) -> Result<Response<CreateResponse>, Status> {
        let CreateRequest { qualified_name, ip } = req.into_inner();
        let target = parse_target(&qualified_name)?;

        let store = self.store.clone();
        let outcome = blocking("create", move || store.create(&target, &ip)).await?;

        Ok(Response::new(CreateResponse {
            clock: outcome.clock.into_inner(),
            ip: outcome.ip.to_string(),
            port: u32::from(outcome.port),
        }))
    }

    async fn update(
        &self,
        req: Request<UpdateRequest>,
    ) -> Result<Response<ClockResponse>, Status> {
        let UpdateRequest {
            qualified_name,
            option,
            param,
        } = req.into_inner();
        let target = parse_target(&qualified_name)?;
        let option: UpdateOption = option.parse().map_err(|e: crate::Error| e.to_grpc_status())?;

        let store = self.store.clone();
        let clock = blocking("update", move || store.update(&target, option, &param)).await?;

        Ok(Response::new(ClockResponse {
            clock: clock.into_inner(),
        }))
    }

    async fn delete(
        &self,
        req: Request<DeleteRequest>,
    ) -> Result<Response<ClockResponse>, Status> {
        let target = parse_target(&req.into_inner().qualified_name)?;

        let store = self.store.clone();
        let clock = blocking("delete", move || store.delete(&target)).await?;

        Ok(Response::new(ClockResponse {
            clock: clock.into_inner(),
        }))
    }
}

fn parse_target(qualified_name: &str) -> Result<QualifiedName, Status> {
    QualifiedName::parse(qualified_name).map_err(|e| {
        tracing::warn!(error = %e, "rejected request");
        e.to_grpc_status()
    })
}

/// Run a zone operation on the blocking pool; registry errors are logged and
/// returned to the caller.
async fn blocking<T, F>(op: &'static str, f: F) -> Result<T, Status>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::warn!(op, error = %e, "zone operation failed");
            Err(e.to_grpc_status())
        }
        Err(e) => Err(Status::internal(format!("{} task failed: {}", op, e))),
    }
}
