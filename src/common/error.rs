//! Error types for zonemesh

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Registry Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupted zone data: {0}")]
    Corrupted(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    // === Input Errors ===
    #[error("{0}")]
    Usage(String),

    #[error("Invalid qualified name: {0}")]
    InvalidName(String),

    #[error("Invalid update option: {0} (expected \"ip\" or \"name\")")]
    InvalidOption(String),

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("Rejected by replica: {0}")]
    InvalidArgument(String),

    // === Network Errors ===
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("No live replica available")]
    NoLiveReplica,

    // === Bootstrap / Config Errors ===
    #[error("No configured DNS identity matches a local address")]
    NoLocalIdentity,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Transport setup failures end the process; data-path failures do not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailed(_) | Error::Transport(_) | Error::NoLocalIdentity
        )
    }

    /// Convert to gRPC status for RPC responses
    pub fn to_grpc_status(&self) -> tonic::Status {
        use tonic::Code;
        match self {
            Error::NotFound(msg) => tonic::Status::new(Code::NotFound, msg.clone()),
            Error::StateConflict(msg) => tonic::Status::new(Code::FailedPrecondition, msg.clone()),
            Error::Corrupted(msg) => tonic::Status::new(Code::DataLoss, msg.clone()),
            Error::InvalidName(_) | Error::InvalidOption(_) | Error::InvalidAddress(_) => {
                tonic::Status::new(Code::InvalidArgument, self.to_string())
            }
            Error::InvalidArgument(msg) => tonic::Status::new(Code::InvalidArgument, msg.clone()),
            Error::NoLiveReplica => tonic::Status::new(Code::Unavailable, self.to_string()),
            Error::Grpc(status) => status.clone(),
            _ => tonic::Status::new(Code::Internal, self.to_string()),
        }
    }

    /// Recover the registry error kind carried by a status returned from a replica.
    pub fn from_status(status: tonic::Status) -> Self {
        use tonic::Code;
        let message = status.message().to_string();
        match status.code() {
            Code::NotFound => Error::NotFound(message),
            Code::FailedPrecondition => Error::StateConflict(message),
            Code::DataLoss => Error::Corrupted(message),
            Code::InvalidArgument => Error::InvalidArgument(message),
            Code::Unavailable if message.contains("No live replica") => Error::NoLiveReplica,
            _ => Error::Grpc(status),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
