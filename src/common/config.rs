//! Configuration for zonemesh components
//!
//! One cluster file describes the whole topology: the ordered list of DNS node
//! identities, the broker endpoint, and per-node storage settings. Every
//! process (node, broker, admin) reads the same file.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Candidate DNS node identities. Position in this list is the node's
    /// vector clock slot.
    pub dns: Vec<NodeIdentity>,

    /// Broker endpoint
    pub broker: BrokerConfig,

    /// Storage settings for DNS nodes
    #[serde(default)]
    pub node: NodeSettings,

    /// How the broker picks a replica for an unseen domain
    #[serde(default)]
    pub broker_policy: BrokerPolicy,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A configured DNS node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub id: String,
    pub ip: IpAddr,
    pub port: u16,
}

impl NodeIdentity {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// gRPC endpoint URI for this identity
    pub fn uri(&self) -> String {
        endpoint_uri(self.ip, self.port)
    }
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.socket_addr())
    }
}

/// Broker endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_id")]
    pub id: String,
    pub ip: IpAddr,
    pub port: u16,
}

fn default_broker_id() -> String {
    "broker".to_string()
}

impl BrokerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    pub fn uri(&self) -> String {
        endpoint_uri(self.ip, self.port)
    }
}

/// DNS node storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Root directory; zone files go to `zones/`, change logs to `logs/`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Recycle tombstoned lines for new records instead of appending
    #[serde(default)]
    pub reuse_tombstones: bool,

    /// Timeout for liveness probes during bootstrap and broker selection
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_probe_timeout() -> u64 {
    1000
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            reuse_tombstones: false,
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl NodeSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn zones_dir(&self) -> PathBuf {
        self.data_dir.join("zones")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerPolicy {
    #[default]
    Random,
    RoundRobin,
}

impl ClusterConfig {
    /// Load from a TOML or JSON file (by extension), with `ZONEMESH__*`
    /// environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ClusterConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("ZONEMESH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dns.is_empty() {
            return Err(Error::InvalidConfig("no DNS identities configured".into()));
        }

        let mut ids = HashSet::new();
        let mut addrs = HashSet::new();
        for node in &self.dns {
            if node.id.is_empty() {
                return Err(Error::InvalidConfig("DNS identity with empty id".into()));
            }
            if node.ip.is_unspecified() {
                return Err(Error::InvalidConfig(format!(
                    "DNS identity {} has unspecified address {}",
                    node.id, node.ip
                )));
            }
            if !ids.insert(node.id.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate DNS id: {}", node.id)));
            }
            if !addrs.insert(node.socket_addr()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate DNS address: {}",
                    node.socket_addr()
                )));
            }
        }

        Ok(())
    }

    /// Number of vector clock slots
    pub fn replica_count(&self) -> usize {
        self.dns.len()
    }
}

/// Build an `http://` URI, bracketing IPv6 literals.
pub fn endpoint_uri(ip: IpAddr, port: u16) -> String {
    format!("http://{}", SocketAddr::new(ip, port))
}
