//! Common utilities and types shared across zonemesh

pub mod clock;
pub mod config;
pub mod error;
pub mod name;

pub use clock::VectorClock;
pub use config::{BrokerConfig, BrokerPolicy, ClusterConfig, NodeIdentity, NodeSettings};
pub use error::{Error, Result};
pub use name::QualifiedName;

/// Liveness status returned by every healthy service
pub const STATUS_OK: &str = "OK";
