//! # Audit Trail
//!
//! A local signing proxy for audit records. Each record is re-encoded
//! canonically, committed into a transaction that spends the installation's
//! tracked output, signed with the installation key, and forwarded to the
//! remote ledger.
//!
//! ## Overview
//!
//! ```text
//! AuditRecord ─► payload ─► acquire output ─► reserve nonce ─► build ─► sign ─► forward
//!                                                   ▲                                │
//!                                                   └──────── cancel on failure ◄────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use audittrail::{AuditProxy, ProxyConfig};
//!
//! async fn example() {
//!     let config = ProxyConfig::load("config.json").unwrap();
//!     let proxy = AuditProxy::from_config(&config).unwrap();
//!
//!     let body = br#"{"header":{"actor":"alice","intent":"view","object":"doc1"},"details":[]}"#;
//!     let result = proxy.submit_json(body).await.unwrap();
//!     println!("{} {}", result.record_hash_hex(), result.transaction_hash());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `audittrail::core` - hashing, transactions, signatures
//! - `audittrail::store` - key, nonce, and tracked output persistence

pub mod config;
pub mod error;
pub mod forward;
pub mod proxy;

pub use audittrail_core as core;
pub use audittrail_store as store;

pub use config::{ProxyConfig, DEFAULT_CONFIG_PATH, GENESIS_OUTPUT_ID, GENESIS_VALUE};
pub use error::{ProxyError, Result};
pub use forward::{memory::MemoryForwarder, Forwarder, HttpForwarder, Submission, NONCE_HEADER};
pub use proxy::{AuditProxy, SubmitResult};

pub use audittrail_core::{AuditDetail, AuditHeader, AuditRecord, FeePolicy, Hash256, UnspentOutput};
