//! Management client
//!
//! Parses admin commands and routes them to DNS nodes, keeping each domain
//! pinned to the node that first accepted it.

pub mod command;
pub mod router;

pub use command::{Command, USAGE};
pub use router::{Router, RoutingRecord};
