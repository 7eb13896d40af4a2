//! # Audit Trail Store
//!
//! Durable state for the audit trail signer. Everything lives as small files
//! in one data directory:
//!
//! | File | Owner | Contents |
//! |------|-------|----------|
//! | `keyfile.hex` | [`KeyCustodian`] | hex of the 32-byte private scalar |
//! | `nonce.dat` | [`NonceSequencer`] | next nonce, 8 bytes big-endian |
//! | `utxo.json` | [`UtxoLedger`] | the tracked unspent output |
//!
//! All writes go through [`fs::atomic_write`], so a crash leaves each file
//! with either its old or its new contents.
//!
//! ## Design Notes
//!
//! - **Key**: generated once, never replaced. A malformed key file is an
//!   error, not a reason to make a new key.
//! - **Nonce**: the durable counter advances before a nonce is handed out.
//! - **Tracked output**: leased exclusively for the lifetime of one
//!   transaction.

pub mod error;
pub mod fs;
pub mod keystore;
pub mod nonce;
pub mod utxo;

pub use error::{Result, StoreError};
pub use keystore::{KeyCustodian, KEY_FILE_NAME};
pub use nonce::{NonceSequencer, NONCE_FILE_NAME};
pub use utxo::{UtxoLease, UtxoLedger, UTXO_FILE_NAME};
