//! Persistent nonce sequencing.
//!
//! The counter on disk always holds the *next* nonce to hand out. Reserving
//! writes `current + 1` before returning `current`, so a crash between
//! reservation and use burns a nonce but never repeats one.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::fs::{atomic_write, read_if_exists};

/// File name of the nonce counter inside the data directory.
pub const NONCE_FILE_NAME: &str = "nonce.dat";

const COUNTER_LEN: usize = 8;

/// Hands out strictly increasing nonces that survive restarts.
pub struct NonceSequencer {
    path: PathBuf,
    state: Mutex<Option<u64>>,
}

impl NonceSequencer {
    /// Sequencer backed by the counter file inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(NONCE_FILE_NAME))
    }

    /// Sequencer backed by an explicit counter file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Path of the counter file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reserve the next nonce.
    ///
    /// The advanced counter is durable before the nonce is returned. If the
    /// write fails, the in-memory counter is unchanged.
    pub fn reserve(&self) -> Result<u64> {
        let mut state = self.lock()?;
        let current = self.load(&mut state)?;
        let next = current.checked_add(1).ok_or(StoreError::NonceOverflow)?;
        self.persist(next)?;
        *state = Some(next);
        debug!(nonce = current, "reserved nonce");
        Ok(current)
    }

    /// Give back the most recently reserved nonce.
    ///
    /// Only valid while the caller still holds the reservation it is
    /// cancelling and no later reservation has been made.
    pub fn cancel(&self) -> Result<()> {
        let mut state = self.lock()?;
        let current = self.load(&mut state)?;
        let previous = current.checked_sub(1).ok_or(StoreError::NonceUnderflow)?;
        self.persist(previous)?;
        *state = Some(previous);
        debug!(nonce = previous, "cancelled nonce reservation");
        Ok(())
    }

    /// The next nonce that [`reserve`](Self::reserve) would hand out.
    pub fn current(&self) -> Result<u64> {
        let mut state = self.lock()?;
        self.load(&mut state)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<u64>>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn load(&self, state: &mut Option<u64>) -> Result<u64> {
        if let Some(value) = *state {
            return Ok(value);
        }

        let value = match read_if_exists(&self.path)? {
            Some(bytes) => self.decode(&bytes)?,
            None => {
                self.persist(0)?;
                info!(path = %self.path.display(), "initialized nonce counter");
                0
            }
        };
        *state = Some(value);
        Ok(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<u64> {
        let raw: [u8; COUNTER_LEN] =
            bytes
                .try_into()
                .map_err(|_| StoreError::MalformedNonceFile {
                    path: self.path.display().to_string(),
                    reason: format!("expected {} bytes, found {}", COUNTER_LEN, bytes.len()),
                })?;
        Ok(u64::from_be_bytes(raw))
    }

    fn persist(&self, value: u64) -> Result<()> {
        atomic_write(&self.path, &value.to_be_bytes())
    }
}
