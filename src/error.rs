//! Error types for the contract mock engine.

use crate::contract::Method;
use thiserror::Error;

/// Errors raised by contracts, the mock store and transports.
///
/// An unmatched call is not an error at the store level: `MockStore::get_response`
/// yields `None`. It only becomes [`Error::MissingMockResult`] once a
/// [`MockTransport`](crate::transport::MockTransport) hands it back to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// No mock was configured for a call made through the mock transport
    #[error("no mock response configured for {method} {url}")]
    MissingMockResult { method: Method, url: String },

    /// Contract key not present in the collection
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    /// Response key not declared by the contract
    #[error("contract '{contract}' has no response example '{response}'")]
    UnknownResponse { contract: String, response: String },

    /// Contract violates a structural invariant
    #[error("invalid contract '{key}': {reason}")]
    InvalidContract { key: String, reason: String },

    /// HTTP method outside GET, POST, PUT and DELETE
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Failure reported by a transport implementation
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
