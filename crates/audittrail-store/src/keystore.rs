//! Key custody: the one signing keypair of this installation.
//!
//! The key is loaded from its file on first use, or generated and persisted
//! if the file does not exist yet. The whole check-generate-persist-load
//! sequence runs under a lock, so concurrent first callers observe the same
//! key and never a half-written file. Afterwards the cached key is shared
//! without locking.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use audittrail_core::crypto::COORDINATE_LEN;
use audittrail_core::{Keypair, PublicKeyBytes};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::fs::{atomic_write, read_if_exists};

/// File name of the private key inside the data directory.
pub const KEY_FILE_NAME: &str = "keyfile.hex";

/// Owns the installation keypair.
pub struct KeyCustodian {
    path: PathBuf,
    cached: OnceLock<Arc<Keypair>>,
    init_lock: Mutex<()>,
}

impl KeyCustodian {
    /// Custodian for the key file inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(KEY_FILE_NAME))
    }

    /// Custodian for an explicit key file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the keypair, loading or generating it on first call.
    pub fn key(&self) -> Result<Arc<Keypair>> {
        if let Some(key) = self.cached.get() {
            return Ok(Arc::clone(key));
        }

        let _guard = self
            .init_lock
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        // Another caller may have finished while we waited.
        if let Some(key) = self.cached.get() {
            return Ok(Arc::clone(key));
        }

        let key = Arc::new(self.load_or_generate()?);
        let _ = self.cached.set(Arc::clone(&key));
        Ok(key)
    }

    /// The 65-byte uncompressed public key.
    pub fn public_key(&self) -> Result<PublicKeyBytes> {
        Ok(self.key()?.public_key())
    }

    /// The base64 wire address.
    pub fn address(&self) -> Result<String> {
        Ok(self.key()?.address())
    }

    /// The fixed-width private scalar, base64 encoded.
    pub fn private_key_base64(&self) -> Result<String> {
        Ok(self.key()?.private_key_base64())
    }

    fn load_or_generate(&self) -> Result<Keypair> {
        if read_if_exists(&self.path)?.is_none() {
            let generated = Keypair::generate();
            atomic_write(&self.path, hex::encode(generated.private_bytes()).as_bytes())?;
            info!(
                path = %self.path.display(),
                address = %generated.address(),
                "generated new signing key"
            );
        }

        let contents =
            read_if_exists(&self.path)?.ok_or_else(|| self.malformed("key file vanished"))?;
        let key = self.parse(&contents)?;
        debug!(path = %self.path.display(), "loaded signing key");
        Ok(key)
    }

    fn parse(&self, contents: &[u8]) -> Result<Keypair> {
        let text = std::str::from_utf8(contents).map_err(|_| self.malformed("not UTF-8"))?;
        let text = text.trim();
        if text.len() != 2 * COORDINATE_LEN {
            return Err(self.malformed(&format!(
                "expected {} hex characters, found {}",
                2 * COORDINATE_LEN,
                text.len()
            )));
        }
        let bytes = hex::decode(text).map_err(|e| self.malformed(&e.to_string()))?;
        Keypair::from_private_bytes(&bytes).map_err(|e| self.malformed(&e.to_string()))
    }

    fn malformed(&self, reason: &str) -> StoreError {
        StoreError::MalformedKeyFile {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_generates_and_persists_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = KeyCustodian::new(dir.path());
        assert!(!custodian.path().exists());

        let key = custodian.key().unwrap();
        assert!(custodian.path().exists());

        let contents = std::fs::read_to_string(custodian.path()).unwrap();
        assert_eq!(contents, hex::encode(key.private_bytes()));
    }

    #[test]
    fn test_reload_yields_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let first = KeyCustodian::new(dir.path()).public_key().unwrap();
        let second = KeyCustodian::new(dir.path()).public_key().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cached_instance_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = KeyCustodian::new(dir.path());
        let a = custodian.key().unwrap();
        let b = custodian.key().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_first_callers_agree() {
        let dir = tempfile::tempdir().unwrap();
        let custodian = Arc::new(KeyCustodian::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let custodian = Arc::clone(&custodian);
                thread::spawn(move || custodian.public_key().unwrap())
            })
            .collect();

        let keys: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));

        let reloaded = KeyCustodian::new(dir.path()).public_key().unwrap();
        assert_eq!(keys[0], reloaded);
    }

    #[test]
    fn test_existing_key_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let expected = Keypair::from_private_bytes(&[0x07; 32]).unwrap();
        let contents = format!("{}\n", hex::encode([0x07u8; 32]));
        std::fs::write(dir.path().join(KEY_FILE_NAME), contents).unwrap();

        let custodian = KeyCustodian::new(dir.path());
        assert_eq!(custodian.public_key().unwrap(), expected.public_key());
        assert_eq!(custodian.address().unwrap(), expected.address());
    }

    #[test]
    fn test_malformed_key_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KEY_FILE_NAME), "not a key").unwrap();

        let custodian = KeyCustodian::new(dir.path());
        assert!(matches!(
            custodian.key(),
            Err(StoreError::MalformedKeyFile { .. })
        ));
        // Never replaced with an ephemeral key.
        assert_eq!(
            std::fs::read_to_string(custodian.path()).unwrap(),
            "not a key"
        );
    }

    #[test]
    fn test_zero_scalar_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(KEY_FILE_NAME), "00".repeat(32)).unwrap();
        assert!(KeyCustodian::new(dir.path()).key().is_err());
    }

    #[test]
    fn test_private_key_export_is_fixed_width() {
        use base64::Engine;
        let dir = tempfile::tempdir().unwrap();
        let exported = KeyCustodian::new(dir.path()).private_key_base64().unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(exported).unwrap();
        assert_eq!(decoded.len(), 32);
    }
}
