//! The tracked unspent output.
//!
//! Each transaction spends the tracked output and its change output takes its
//! place. Only one transaction may be in flight against the tracked output at
//! a time: callers [`acquire`](UtxoLedger::acquire) a [`UtxoLease`] and either
//! commit the successor output or let the lease go.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use audittrail_core::UnspentOutput;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::fs::{atomic_write, read_if_exists};

/// File name of the tracked output inside the data directory.
pub const UTXO_FILE_NAME: &str = "utxo.json";

/// Durable home of the tracked output.
#[derive(Clone)]
pub struct UtxoLedger {
    path: PathBuf,
    genesis: UnspentOutput,
    state: Arc<Mutex<Option<UnspentOutput>>>,
}

impl UtxoLedger {
    /// Ledger backed by the output file inside `data_dir`. `genesis` is
    /// tracked when no file exists yet.
    pub fn new(data_dir: impl AsRef<Path>, genesis: UnspentOutput) -> Self {
        Self::at_path(data_dir.as_ref().join(UTXO_FILE_NAME), genesis)
    }

    /// Ledger backed by an explicit file.
    pub fn at_path(path: impl Into<PathBuf>, genesis: UnspentOutput) -> Self {
        Self {
            path: path.into(),
            genesis,
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for exclusive use of the tracked output.
    pub async fn acquire(&self) -> Result<UtxoLease> {
        let mut guard = Arc::clone(&self.state).lock_owned().await;
        let output = self.load(&mut guard)?;
        Ok(UtxoLease {
            path: self.path.clone(),
            output,
            guard,
            settled: false,
        })
    }

    /// The tracked output, waiting for any in-flight lease to finish.
    pub async fn current(&self) -> Result<UnspentOutput> {
        let mut guard = self.state.lock().await;
        self.load(&mut guard)
    }

    fn load(&self, state: &mut Option<UnspentOutput>) -> Result<UnspentOutput> {
        if let Some(output) = *state {
            return Ok(output);
        }

        let output = match read_if_exists(&self.path)? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StoreError::MalformedUtxoFile {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                })?
            }
            None => {
                persist(&self.path, &self.genesis)?;
                info!(
                    output_id = %self.genesis.output_id,
                    value = self.genesis.value,
                    "tracking genesis output"
                );
                self.genesis
            }
        };
        *state = Some(output);
        Ok(output)
    }
}

/// Exclusive hold on the tracked output.
///
/// Dropping the lease without calling [`commit`](Self::commit) leaves the
/// tracked output unchanged.
pub struct UtxoLease {
    path: PathBuf,
    output: UnspentOutput,
    guard: OwnedMutexGuard<Option<UnspentOutput>>,
    settled: bool,
}

impl UtxoLease {
    /// The output this lease may spend.
    pub fn output(&self) -> UnspentOutput {
        self.output
    }

    /// Replace the tracked output with `next`.
    ///
    /// The in-memory state advances even if the write fails: the spend has
    /// already happened and the old output is no longer spendable. The error
    /// is still returned so the caller can report it.
    pub fn commit(mut self, next: UnspentOutput) -> Result<()> {
        *self.guard = Some(next);
        self.settled = true;
        debug!(output_id = %next.output_id, value = next.value, "advanced tracked output");
        persist(&self.path, &next)
    }

    /// Release the lease, keeping the current output.
    pub fn abort(mut self) {
        self.settled = true;
        debug!(output_id = %self.output.output_id, "released tracked output unchanged");
    }
}

impl Drop for UtxoLease {
    fn drop(&mut self) {
        if !self.settled {
            debug!(output_id = %self.output.output_id, "lease dropped without commit");
        }
    }
}

fn persist(path: &Path, output: &UnspentOutput) -> Result<()> {
    let bytes = serde_json::to_vec(output).map_err(|e| StoreError::MalformedUtxoFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    atomic_write(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audittrail_core::Hash256;
    use std::time::Duration;

    fn genesis() -> UnspentOutput {
        UnspentOutput::new(Hash256::from_bytes([0x9b; 32]), 100_000_000)
    }

    fn successor(value: i64) -> UnspentOutput {
        UnspentOutput::new(Hash256::from_bytes([0x42; 32]), value)
    }

    #[tokio::test]
    async fn test_fresh_ledger_tracks_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UtxoLedger::new(dir.path(), genesis());
        assert_eq!(ledger.current().await.unwrap(), genesis());
        assert!(ledger.path().exists());
    }

    #[tokio::test]
    async fn test_commit_advances_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UtxoLedger::new(dir.path(), genesis());

        let lease = ledger.acquire().await.unwrap();
        assert_eq!(lease.output(), genesis());
        lease.commit(successor(99_000_000)).unwrap();

        assert_eq!(ledger.current().await.unwrap(), successor(99_000_000));
        let reloaded = UtxoLedger::new(dir.path(), genesis());
        assert_eq!(reloaded.current().await.unwrap(), successor(99_000_000));
    }

    #[tokio::test]
    async fn test_abort_and_drop_keep_output() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UtxoLedger::new(dir.path(), genesis());

        ledger.acquire().await.unwrap().abort();
        assert_eq!(ledger.current().await.unwrap(), genesis());

        drop(ledger.acquire().await.unwrap());
        assert_eq!(ledger.current().await.unwrap(), genesis());
    }

    #[tokio::test]
    async fn test_lease_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UtxoLedger::new(dir.path(), genesis());

        let lease = ledger.acquire().await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(50), ledger.acquire()).await;
        assert!(waiting.is_err());

        lease.commit(successor(5)).unwrap();
        let next = ledger.acquire().await.unwrap();
        assert_eq!(next.output(), successor(5));
    }

    #[tokio::test]
    async fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(UTXO_FILE_NAME), b"{broken").unwrap();
        let ledger = UtxoLedger::new(dir.path(), genesis());
        assert!(matches!(
            ledger.acquire().await,
            Err(StoreError::MalformedUtxoFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UtxoLedger::new(dir.path(), genesis());
        ledger.current().await.unwrap();

        let stored: serde_json::Value =
            serde_json::from_slice(&std::fs::read(ledger.path()).unwrap()).unwrap();
        assert_eq!(stored["outputId"], genesis().output_id.to_hex());
        assert_eq!(stored["value"], 100_000_000);
    }
}
