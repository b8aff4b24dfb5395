//! DNS node implementation
//!
//! A node owns a disjoint set of domains and handles:
//! - Identity bootstrap against the static topology
//! - Create / Update / Delete on per-domain zone files
//! - Append-only change logs
//! - Per-domain vector clocks

pub mod bootstrap;
pub mod changelog;
pub mod grpc;
pub mod lines;
pub mod server;
pub mod zone;

pub use server::NodeServer;
pub use zone::{CreateOutcome, DomainSnapshot, UpdateOption, ZoneStore};
