//! # Audit Trail Testkit
//!
//! Testing utilities for the audit trail signer.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: identifiers the remote ledger must recompute byte for byte
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: a proxy over a throwaway data directory and an in-memory remote
//!
//! ## Golden Vectors
//!
//! ```rust
//! use audittrail_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, actual) in verify_all_vectors() {
//!     assert!(ok, "{name}: {actual}");
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use audittrail_testkit::fixtures::{sample_record, TestFixture};
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let result = fixture.proxy.submit(&sample_record()).await.unwrap();
//!     assert_eq!(fixture.forwarder().received().len(), 1);
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{sample_record, TestFixture, SAMPLE_RECORD_JSON, SHUFFLED_RECORD_JSON};
pub use vectors::{
    merkle_vectors, record_vectors, transaction_vector, verify_all_vectors, MerkleVector,
    RecordVector, TransactionVector,
};
