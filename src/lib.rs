//! # zonemesh
//!
//! A distributed domain-name registry:
//! - DNS nodes each own a disjoint set of domains
//! - Records live in line-oriented zone files with in-place tombstones
//! - Every mutation is appended to a per-domain change log
//! - Per-domain vector clocks count each node's writes
//! - A broker assigns unseen domains; clients keep domains on their node
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────┐  Get()   ┌──────────────┐
//!   │ admin client │─────────▶│    Broker    │
//!   │ (sticky      │          └──────┬───────┘
//!   │  routes)     │                 │ Status()
//!   └──────┬───────┘                 ▼
//!          │ Create/Update/Delete ┌──────────┐ ┌──────────┐ ┌──────────┐
//!          └─────────────────────▶│  DNS1    │ │  DNS2    │ │  DNS3    │
//!                                 │ zones/   │ │ zones/   │ │ zones/   │
//!                                 │ logs/    │ │ logs/    │ │ logs/    │
//!                                 └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start the broker and DNS nodes
//! ```bash
//! zonemesh-broker --config zonemesh.toml
//! zonemesh-node --config zonemesh.toml   # adopts the first free local identity
//! ```
//!
//! ### Manage records
//! ```bash
//! zonemesh-admin --config zonemesh.toml
//! -> create www.example 10.0.0.7
//! -> update www.example ip 10.0.0.8
//! -> update www.example name web
//! -> delete web.example
//! ```

#![allow(clippy::result_large_err)]

pub mod broker;
pub mod client;
pub mod common;
pub mod node;

// Re-export commonly used types
pub use broker::RoutingDirectory;
pub use client::Router;
pub use common::{ClusterConfig, Error, Result};
pub use node::NodeServer;

// Generated protobuf code
pub mod proto {
    tonic::include_proto!("zonemesh");
}

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
