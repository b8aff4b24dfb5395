//! Broker (routing directory)
//!
//! Answers `Get` with a live DNS node endpoint and `Status` with "OK".

pub mod grpc;
pub mod server;

pub use server::RoutingDirectory;
