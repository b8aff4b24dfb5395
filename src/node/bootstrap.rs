//! Node identity bootstrap
//!
//! A starting process walks the configured DNS identities in order and
//! adopts the first one that lives on this machine and has no server
//! answering yet:
//!
//! ```text
//! for candidate in config.dns:
//!     ip not local        → skip
//!     probe answers "OK"  → remember as peer, keep scanning
//!     probe gets no reply → adopt candidate, stop
//! ```
//!
//! An endpoint that cannot even be built for a local candidate is fatal.

use crate::common::{Error, NodeIdentity, Result, STATUS_OK};
use crate::proto::dns_node_client::DnsNodeClient;
use crate::proto::Empty;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::Duration;
use tonic::transport::Endpoint;

/// Identity chosen for this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adoption {
    pub identity: NodeIdentity,
    /// Position in the configured list, used as the vector clock slot
    pub slot: usize,
    /// Local candidates already served by a healthy node
    pub peers: Vec<NodeIdentity>,
}

/// Outcome of a liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Healthy,
    /// Answered with something other than "OK"
    Unhealthy(String),
    /// No server answered
    Unreachable(String),
}

/// An address is local if a socket can be bound to it.
pub fn is_local_address(ip: IpAddr) -> bool {
    UdpSocket::bind(SocketAddr::new(ip, 0)).is_ok()
}

/// Candidate addresses that belong to this machine.
pub fn local_addresses(candidates: &[NodeIdentity]) -> HashSet<IpAddr> {
    candidates
        .iter()
        .map(|c| c.ip)
        .filter(|ip| is_local_address(*ip))
        .collect()
}

/// Ask the node at `uri` for its status.
///
/// Fails only when no channel can be built for `uri`; a silent or refusing
/// server is reported as [`Probe::Unreachable`].
pub async fn probe(uri: &str, timeout: Duration) -> Result<Probe> {
    let endpoint = Endpoint::from_shared(uri.to_string())
        .map_err(|e| Error::ConnectionFailed(format!("cannot open channel to {}: {}", uri, e)))?
        .connect_timeout(timeout)
        .timeout(timeout);

    let mut client = DnsNodeClient::new(endpoint.connect_lazy());
    match client.status(Empty {}).await {
        Ok(resp) => {
            let status = resp.into_inner().status;
            if status == STATUS_OK {
                Ok(Probe::Healthy)
            } else {
                Ok(Probe::Unhealthy(status))
            }
        }
        Err(status) => Ok(Probe::Unreachable(status.message().to_string())),
    }
}

/// Scan `candidates` and pick the identity this process should adopt.
pub async fn adopt_identity(
    candidates: &[NodeIdentity],
    local: &HashSet<IpAddr>,
    timeout: Duration,
) -> Result<Adoption> {
    let mut peers = Vec::new();

    for (slot, candidate) in candidates.iter().enumerate() {
        if !local.contains(&candidate.ip) {
            tracing::debug!(%candidate, "not a local address, skipping");
            continue;
        }

        match probe(&candidate.uri(), timeout).await? {
            Probe::Healthy => {
                tracing::info!(%candidate, "DNS node already running, recording peer");
                peers.push(candidate.clone());
            }
            Probe::Unhealthy(status) => {
                tracing::warn!(%candidate, %status, "DNS node answered but is not healthy");
            }
            Probe::Unreachable(reason) => {
                tracing::info!(%candidate, slot, %reason, "no live node at address, adopting identity");
                return Ok(Adoption {
                    identity: candidate.clone(),
                    slot,
                    peers,
                });
            }
        }
    }

    tracing::warn!(
        candidates = candidates.len(),
        live_peers = peers.len(),
        "no configured DNS identity can be adopted on this machine"
    );
    Err(Error::NoLocalIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, ip: &str, port: u16) -> NodeIdentity {
        NodeIdentity {
            id: id.to_string(),
            ip: ip.parse().unwrap(),
            port,
        }
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn test_local_address_detection() {
        assert!(is_local_address("127.0.0.1".parse().unwrap()));
        // TEST-NET-1 is never assigned to an interface.
        assert!(!is_local_address("192.0.2.1".parse().unwrap()));

        let local = local_addresses(&[
            identity("DNS1", "192.0.2.1", 9001),
            identity("DNS2", "127.0.0.1", 9002),
        ]);
        assert_eq!(local.len(), 1);
        assert!(local.contains(&"127.0.0.1".parse::<IpAddr>().unwrap()));
    }

    #[tokio::test]
    async fn test_adopts_first_local_candidate_without_server() {
        let candidates = vec![
            identity("DNS1", "192.0.2.1", 9001),
            identity("DNS2", "127.0.0.1", free_port()),
        ];
        let local = local_addresses(&candidates);

        let adoption = adopt_identity(&candidates, &local, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(adoption.identity.id, "DNS2");
        assert_eq!(adoption.slot, 1);
        assert!(adoption.peers.is_empty());
    }

    #[tokio::test]
    async fn test_no_local_candidate() {
        let candidates = vec![identity("DNS1", "192.0.2.1", 9001)];
        let local = local_addresses(&candidates);

        let err = adopt_identity(&candidates, &local, Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoLocalIdentity));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let uri = format!("http://127.0.0.1:{}", free_port());
        let probe = probe(&uri, Duration::from_millis(500)).await.unwrap();
        assert!(matches!(probe, Probe::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_probe_bad_uri_is_fatal() {
        let err = probe("not a uri", Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
    }
}
