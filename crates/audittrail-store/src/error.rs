//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error reading or writing a state file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key file exists but does not hold a valid private key.
    #[error("malformed key file {path}: {reason}")]
    MalformedKeyFile { path: String, reason: String },

    /// The nonce file exists but is not an 8-byte counter.
    #[error("malformed nonce file {path}: {reason}")]
    MalformedNonceFile { path: String, reason: String },

    /// The tracked output file exists but cannot be parsed.
    #[error("malformed unspent output file {path}: {reason}")]
    MalformedUtxoFile { path: String, reason: String },

    /// Cancelling would take the counter below zero.
    #[error("nonce counter is already zero")]
    NonceUnderflow,

    /// Reserving would overflow the counter.
    #[error("nonce counter exhausted")]
    NonceOverflow,

    /// A lock was poisoned by a panicking holder.
    #[error("state lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
