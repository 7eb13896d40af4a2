//! Error types for the audit trail core.

use thiserror::Error;

/// Core errors that can occur while building, encoding, or signing
/// transactions.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot build a Merkle tree over an empty set")]
    EmptyMerkleSet,

    #[error("insufficient funds: output holds {available}, fee {fee} plus payload value {payload_value} required")]
    InsufficientFunds {
        available: i64,
        fee: i64,
        payload_value: i64,
    },

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed DER signature: {0}")]
    MalformedDer(String),

    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::EncodingError(e.to_string())
    }
}
