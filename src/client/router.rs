//! Sticky routing for management commands
//!
//! The first operation on a domain goes to whichever node the broker hands
//! out. Every later operation on that domain reuses the node that answered,
//! so one node sees the domain's whole mutation history in order.
//!
//! ```text
//! command(domain)
//!   ├─ routes[domain] present → cached ip:port
//!   └─ absent                 → Broker.Get()
//!         │
//!         ▼
//!   DnsNode.{Create,Update,Delete}
//!         │ ok                  → routes[domain] = {clock, ip, port}
//!         └ err                 → routes untouched, error surfaced once
//! ```

use crate::client::command::Command;
use crate::common::config::endpoint_uri;
use crate::common::{BrokerConfig, Error, Result, VectorClock, STATUS_OK};
use crate::proto::broker_client::BrokerClient;
use crate::proto::dns_node_client::DnsNodeClient;
use crate::proto::{CreateRequest, DeleteRequest, Empty, UpdateRequest};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use tonic::transport::Channel;

/// Last known state of a domain, as seen by this client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRecord {
    pub clock: VectorClock,
    pub ip: IpAddr,
    pub port: u16,
}

impl RoutingRecord {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

pub struct Router {
    broker: BrokerClient<Channel>,
    replicas: HashMap<SocketAddr, DnsNodeClient<Channel>>,
    routes: HashMap<String, RoutingRecord>,
}

impl Router {
    /// Connect to the broker and check it is alive. Any failure is fatal.
    pub async fn connect(broker: &BrokerConfig) -> Result<Self> {
        tracing::info!(broker = %broker.socket_addr(), "connecting to broker");
        let mut client = BrokerClient::connect(broker.uri()).await.map_err(|e| {
            Error::ConnectionFailed(format!("broker {}: {}", broker.socket_addr(), e))
        })?;

        let status = client
            .status(Empty {})
            .await
            .map_err(|s| Error::ConnectionFailed(format!("broker status: {}", s.message())))?
            .into_inner()
            .status;
        if status != STATUS_OK {
            return Err(Error::ConnectionFailed(format!(
                "broker reported status {:?}",
                status
            )));
        }

        Ok(Self {
            broker: client,
            replicas: HashMap::new(),
            routes: HashMap::new(),
        })
    }

    /// Cached route for `domain`, if any
    pub fn route(&self, domain: &str) -> Option<&RoutingRecord> {
        self.routes.get(domain)
    }

    pub fn routes(&self) -> &HashMap<String, RoutingRecord> {
        &self.routes
    }

    /// Dispatch `command` and return the domain's new vector clock.
    pub async fn execute(&mut self, command: &Command) -> Result<VectorClock> {
        let target = command.target();
        let domain = target.domain();
        let addr = self.endpoint_for(domain).await?;
        let mut node = self.replica(addr).await?;

        let record = match command {
            Command::Create { ip, .. } => {
                let resp = node
                    .create(CreateRequest {
                        qualified_name: target.to_string(),
                        ip: ip.clone(),
                    })
                    .await
                    .map_err(Error::from_status)?
                    .into_inner();
                RoutingRecord {
                    clock: VectorClock::from(resp.clock),
                    ip: resp
                        .ip
                        .parse()
                        .map_err(|_| Error::Internal(format!("node returned bad ip {:?}", resp.ip)))?,
                    port: u16::try_from(resp.port)
                        .map_err(|_| Error::Internal(format!("node returned bad port {}", resp.port)))?,
                }
            }
            Command::Update { option, value, .. } => {
                let resp = node
                    .update(UpdateRequest {
                        qualified_name: target.to_string(),
                        option: option.to_string(),
                        param: value.clone(),
                    })
                    .await
                    .map_err(Error::from_status)?
                    .into_inner();
                RoutingRecord {
                    clock: VectorClock::from(resp.clock),
                    ip: addr.ip(),
                    port: addr.port(),
                }
            }
            Command::Delete { .. } => {
                let resp = node
                    .delete(DeleteRequest {
                        qualified_name: target.to_string(),
                    })
                    .await
                    .map_err(Error::from_status)?
                    .into_inner();
                RoutingRecord {
                    clock: VectorClock::from(resp.clock),
                    ip: addr.ip(),
                    port: addr.port(),
                }
            }
        };

        tracing::info!(
            command = command.verb(),
            record = %target,
            node = %record.socket_addr(),
            clock = %record.clock,
            "command applied"
        );

        let clock = record.clock.clone();
        self.routes.insert(domain.to_string(), record);
        Ok(clock)
    }

    /// Sticky route if known, otherwise ask the broker.
    async fn endpoint_for(&mut self, domain: &str) -> Result<SocketAddr> {
        if let Some(route) = self.routes.get(domain) {
            tracing::debug!(domain, node = %route.socket_addr(), "using cached route");
            return Ok(route.socket_addr());
        }

        let endpoint = self
            .broker
            .get(Empty {})
            .await
            .map_err(|status| match Error::from_status(status) {
                Error::NoLiveReplica => Error::NoLiveReplica,
                other => Error::ConnectionFailed(format!("broker get: {}", other)),
            })?
            .into_inner();

        let ip: IpAddr = endpoint
            .ip
            .parse()
            .map_err(|_| Error::Internal(format!("broker returned bad ip {:?}", endpoint.ip)))?;
        let port = u16::try_from(endpoint.port)
            .map_err(|_| Error::Internal(format!("broker returned bad port {}", endpoint.port)))?;

        tracing::debug!(domain, node = %SocketAddr::new(ip, port), "broker assigned node");
        Ok(SocketAddr::new(ip, port))
    }

    /// Channel to the node at `addr`, opened once and reused.
    async fn replica(&mut self, addr: SocketAddr) -> Result<DnsNodeClient<Channel>> {
        if let Some(client) = self.replicas.get(&addr) {
            return Ok(client.clone());
        }

        let client = DnsNodeClient::connect(endpoint_uri(addr.ip(), addr.port()))
            .await
            .map_err(|e| Error::ConnectionFailed(format!("DNS node {}: {}", addr, e)))?;
        self.replicas.insert(addr, client.clone());
        Ok(client)
    }
}
