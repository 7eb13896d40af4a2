//! Error types for the proxy.

use audittrail_core::CoreError;
use audittrail_store::StoreError;
use thiserror::Error;

/// Errors that can occur while handling an audit submission.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The submitted record could not be decoded or re-encoded.
    #[error("malformed audit record: {0}")]
    MalformedRecord(String),

    /// The signing key could not be loaded or generated.
    #[error("key custody error: {0}")]
    Key(StoreError),

    /// The nonce counter could not be read, advanced, or rolled back.
    #[error("nonce error: {0}")]
    Nonce(StoreError),

    /// The tracked output could not be loaded or advanced.
    #[error("unspent output error: {0}")]
    Ledger(StoreError),

    /// The tracked output cannot cover the fee and the payload output.
    #[error("insufficient funds: available {available}, fee {fee}, payload value {payload_value}")]
    InsufficientFunds {
        available: i64,
        fee: i64,
        payload_value: i64,
    },

    /// Building or signing the transaction failed.
    #[error("signing error: {0}")]
    Signing(CoreError),

    /// The remote ledger could not be reached.
    #[error("forwarding error: {message}")]
    Forwarding {
        status: Option<u16>,
        message: String,
    },

    /// The remote ledger answered with something other than 201 Created.
    #[error("received error from server: {status} {reason}")]
    Rejected { status: u16, reason: String },

    /// The configuration file is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProxyError {
    /// Upstream HTTP status, if the remote answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ProxyError::Forwarding { status, .. } => *status,
            ProxyError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<CoreError> for ProxyError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientFunds {
                available,
                fee,
                payload_value,
            } => ProxyError::InsufficientFunds {
                available,
                fee,
                payload_value,
            },
            CoreError::DecodingError(msg) => ProxyError::MalformedRecord(msg),
            other => ProxyError::Signing(other),
        }
    }
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
