//! # Audit Trail Core
//!
//! Pure primitives for the audit trail signer: hashing, Merkle commitments,
//! transactions, and secp256k1 signatures.
//!
//! This crate contains no I/O, no storage, no networking. Everything here is
//! deterministic given its inputs (output nonces come from a caller-supplied
//! RNG).
//!
//! ## Key Types
//!
//! - [`Hash256`] - 256-bit digest / identifier / Merkle node
//! - [`Transaction`] - inputs, outputs, and a timestamp
//! - [`TransactionBuilder`] - spend the tracked output, pay the fee, return change
//! - [`Keypair`] - the secp256k1 signing key
//! - [`AuditRecord`] - the client-facing record and its ledger payload
//!
//! ## Canonicalization
//!
//! Identifiers are computed over canonical JSON. See [`canonical`] module.

pub mod audit;
pub mod builder;
pub mod canonical;
pub mod crypto;
pub mod der;
pub mod error;
pub mod merkle;
pub mod signer;
pub mod transaction;
pub mod types;

pub use audit::{AuditDetail, AuditHeader, AuditPayload, AuditRecord};
pub use builder::{BuiltTransaction, FeePolicy, TransactionBuilder};
pub use canonical::canonical_json;
pub use crypto::{serialize_public_key, sha256, Keypair, PublicKeyBytes};
pub use der::{der_to_points, points_to_der};
pub use error::{CoreError, Result};
pub use merkle::merkle_root;
pub use signer::{sign_transaction, verify_signature, verify_transaction};
pub use transaction::{InputData, OutputData, Transaction, TransactionInput, TransactionOutput};
pub use types::{Hash256, UnspentOutput};
