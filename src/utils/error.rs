//! Error types for valkey-diag

use std::io;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DiagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Report output error: {0}")]
    Io(#[from] io::Error),
}

impl DiagError {
    /// Address of the node the error happened on, when known
    pub fn node(&self) -> Option<&str> {
        match self {
            DiagError::Connection(e) => e.node(),
            DiagError::Protocol(e) => Some(e.node()),
            _ => None,
        }
    }
}

/// Connection-related errors: target unreachable, auth rejected, transport broken
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Invalid node address: {0:?}")]
    InvalidAddress(String),

    #[error("Failed to connect to {address}: {source}")]
    ConnectFailed { address: String, source: io::Error },

    #[error("Authentication rejected by {address}: {reason}")]
    AuthFailed { address: String, reason: String },

    #[error("{command} on {address} failed: {source}")]
    Io {
        address: String,
        command: String,
        source: io::Error,
    },
}

impl ConnectionError {
    pub fn node(&self) -> Option<&str> {
        match self {
            ConnectionError::InvalidAddress(_) => None,
            ConnectionError::ConnectFailed { address, .. }
            | ConnectionError::AuthFailed { address, .. }
            | ConnectionError::Io { address, .. } => Some(address),
        }
    }
}

/// Reply-level errors: the transport worked but the reply was not usable
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("{command} on {address} returned an error: {message}")]
    ServerError {
        address: String,
        command: String,
        message: String,
    },

    #[error("Unexpected {command} reply from {address}: expected {expected}, got {actual}")]
    UnexpectedResponse {
        address: String,
        command: String,
        expected: &'static str,
        actual: String,
    },
}

impl ProtocolError {
    pub fn node(&self) -> &str {
        match self {
            ProtocolError::ServerError { address, .. }
            | ProtocolError::UnexpectedResponse { address, .. } => address,
        }
    }
}

pub type Result<T> = std::result::Result<T, DiagError>;
