//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::sync::Arc;

use audittrail::{AuditProxy, MemoryForwarder, GENESIS_OUTPUT_ID, GENESIS_VALUE};
use audittrail_core::{AuditDetail, AuditHeader, AuditRecord, FeePolicy, Hash256, UnspentOutput};
use tempfile::TempDir;

/// The reference record, in canonical form.
pub const SAMPLE_RECORD_JSON: &str = r#"{"header":{"actor":"alice","intent":"view","object":"doc1"},"details":[{"k":"ip","v":"10.0.0.1"}]}"#;

/// The reference record with keys reordered and whitespace added.
pub const SHUFFLED_RECORD_JSON: &str = r#"{
    "details": [ { "v": "10.0.0.1", "k": "ip" } ],
    "header": { "object": "doc1", "intent": "view", "actor": "alice" }
}"#;

/// The reference record as a value.
pub fn sample_record() -> AuditRecord {
    AuditRecord {
        header: AuditHeader {
            actor: "alice".into(),
            intent: "view".into(),
            object: "doc1".into(),
        },
        details: Some(vec![AuditDetail {
            key: "ip".into(),
            value: "10.0.0.1".into(),
        }]),
    }
}

/// A proxy over a private temporary data directory and an in-memory
/// forwarder.
pub struct TestFixture {
    dir: TempDir,
    pub proxy: Arc<AuditProxy<MemoryForwarder>>,
}

impl TestFixture {
    /// A fixture whose remote accepts everything.
    pub fn new() -> Self {
        Self::with_forwarder(MemoryForwarder::accepting())
    }

    /// A fixture whose remote answers every submission with `status`.
    pub fn rejecting(status: u16) -> Self {
        Self::with_forwarder(MemoryForwarder::with_status(status))
    }

    /// A fixture starting from a custom genesis output.
    pub fn with_genesis(genesis: UnspentOutput) -> Self {
        let dir = temp_dir();
        let proxy = AuditProxy::new(
            dir.path(),
            genesis,
            FeePolicy::default(),
            MemoryForwarder::accepting(),
        );
        Self {
            dir,
            proxy: Arc::new(proxy),
        }
    }

    fn with_forwarder(forwarder: MemoryForwarder) -> Self {
        let dir = temp_dir();
        let proxy = AuditProxy::new(dir.path(), genesis(), FeePolicy::default(), forwarder);
        Self {
            dir,
            proxy: Arc::new(proxy),
        }
    }

    /// The data directory.
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// A new proxy over the same data directory, as after a restart.
    pub fn restart(&self) -> AuditProxy<MemoryForwarder> {
        AuditProxy::new(
            self.dir.path(),
            genesis(),
            FeePolicy::default(),
            MemoryForwarder::accepting(),
        )
    }

    /// The in-memory forwarder.
    pub fn forwarder(&self) -> &MemoryForwarder {
        self.proxy.forwarder()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The genesis output every fresh installation tracks.
pub fn genesis() -> UnspentOutput {
    UnspentOutput::new(GENESIS_OUTPUT_ID, GENESIS_VALUE)
}

/// A hash with every byte set to `byte`.
pub fn filled_hash(byte: u8) -> Hash256 {
    Hash256::from_bytes([byte; 32])
}

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temporary data directory")
}
