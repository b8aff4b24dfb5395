//! Broker gRPC service
//!
//! Hands out a live DNS node for domains a client has not routed yet. The
//! broker keeps no per-domain state; stickiness is the client's job.

use crate::common::{BrokerPolicy, Error, NodeIdentity, STATUS_OK};
use crate::node::bootstrap::{probe, Probe};
use crate::proto::broker_server::{Broker, BrokerServer};
use crate::proto::{Empty, Endpoint, StatusResponse};
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tonic::{Request, Response, Status};

pub struct BrokerGrpcService {
    replicas: Vec<NodeIdentity>,
    policy: BrokerPolicy,
    cursor: AtomicUsize,
    probe_timeout: Duration,
}

impl BrokerGrpcService {
    pub fn new(replicas: Vec<NodeIdentity>, policy: BrokerPolicy, probe_timeout: Duration) -> Self {
        Self {
            replicas,
            policy,
            cursor: AtomicUsize::new(0),
            probe_timeout,
        }
    }

    /// Converts this service into a gRPC server instance.
    pub fn into_server(self) -> BrokerServer<Self> {
        BrokerServer::new(self)
    }

    /// Candidates in the order they should be tried.
    fn candidate_order(&self) -> Vec<&NodeIdentity> {
        let mut order: Vec<&NodeIdentity> = self.replicas.iter().collect();
        match self.policy {
            BrokerPolicy::Random => order.shuffle(&mut rand::thread_rng()),
            BrokerPolicy::RoundRobin => {
                if !order.is_empty() {
                    let start = self.cursor.fetch_add(1, Ordering::Relaxed) % order.len();
                    order.rotate_left(start);
                }
            }
        }
        order
    }

    /// First candidate that answers its liveness probe.
    pub async fn select(&self) -> crate::Result<NodeIdentity> {
        for candidate in self.candidate_order() {
            match probe(&candidate.uri(), self.probe_timeout).await {
                Ok(Probe::Healthy) => {
                    tracing::debug!(%candidate, "selected replica");
                    return Ok(candidate.clone());
                }
                Ok(other) => tracing::debug!(%candidate, probe = ?other, "replica not available"),
                Err(e) => tracing::warn!(%candidate, error = %e, "cannot probe replica"),
            }
        }

        tracing::warn!(replicas = self.replicas.len(), "no live replica");
        Err(Error::NoLiveReplica)
    }
}

#[tonic::async_trait]
impl Broker for BrokerGrpcService {
    async fn status(&self, _req: Request<Empty>) -> Result<Response<StatusResponse>, Status> {
        Ok(Response::new(StatusResponse {
            status: STATUS_OK.to_string(),
        }))
    }

    async fn get(&self, _req: Request<Empty>) -> Result<Response<Endpoint>, Status> {
        let replica = self.select().await.map_err(|e| e.to_grpc_status())?;
        tracing::info!(replica = %replica, "assigned replica");

        Ok(Response::new(Endpoint {
            ip: replica.ip.to_string(),
            port: u32::from(replica.port),
        }))
    }
}
