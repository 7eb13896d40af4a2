//! The proxy service: one audit record in, one signed transaction out.

use std::path::Path;

use audittrail_core::{
    sign_transaction, AuditRecord, FeePolicy, Hash256, PublicKeyBytes, TransactionBuilder,
    UnspentOutput,
};
use audittrail_store::{KeyCustodian, NonceSequencer, UtxoLease, UtxoLedger};
use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, Result};
use crate::forward::{Forwarder, HttpForwarder, Submission};

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitResult {
    /// SHA-256 of the canonical record.
    pub record_hash: Hash256,
    /// Identifier of the forwarded transaction.
    pub transaction_id: Hash256,
    /// Sequence nonce the transaction was sent with.
    pub nonce: u64,
    /// Fee paid.
    pub fee: i64,
}

impl SubmitResult {
    /// Record hash as plain hex.
    pub fn record_hash_hex(&self) -> String {
        self.record_hash.to_hex()
    }

    /// Transaction identifier as `0x`-prefixed hex.
    pub fn transaction_hash(&self) -> String {
        format!("0x{}", self.transaction_id.to_hex())
    }
}

/// Owns all signing state and runs the submission pipeline.
///
/// Submissions are serialized on the tracked output: each one holds the
/// output lease from nonce reservation until the forwarder answers, so at
/// most one nonce is ever outstanding.
pub struct AuditProxy<F: Forwarder = HttpForwarder> {
    keys: KeyCustodian,
    nonces: NonceSequencer,
    ledger: UtxoLedger,
    forwarder: F,
    policy: FeePolicy,
}

impl AuditProxy<HttpForwarder> {
    /// Build a proxy from configuration, forwarding over HTTP.
    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        let forwarder = HttpForwarder::new(config.send_url(), config.forward_timeout())?;
        Ok(Self::new(
            &config.data_dir,
            config.genesis,
            config.fee,
            forwarder,
        ))
    }
}

impl<F: Forwarder> AuditProxy<F> {
    /// Create a proxy keeping its state under `data_dir`.
    pub fn new(
        data_dir: impl AsRef<Path>,
        genesis: UnspentOutput,
        policy: FeePolicy,
        forwarder: F,
    ) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            keys: KeyCustodian::new(data_dir),
            nonces: NonceSequencer::new(data_dir),
            ledger: UtxoLedger::new(data_dir, genesis),
            forwarder,
            policy,
        }
    }

    /// The forwarder.
    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    /// The installation's public key, generating the key if needed.
    pub fn public_key(&self) -> Result<PublicKeyBytes> {
        self.keys.public_key().map_err(ProxyError::Key)
    }

    /// The installation's address, generating the key if needed.
    pub fn address(&self) -> Result<String> {
        self.keys.address().map_err(ProxyError::Key)
    }

    /// The next nonce that would be reserved.
    pub fn next_nonce(&self) -> Result<u64> {
        self.nonces.current().map_err(ProxyError::Nonce)
    }

    /// The output the next submission will spend.
    pub async fn tracked_output(&self) -> Result<UnspentOutput> {
        self.ledger.current().await.map_err(ProxyError::Ledger)
    }

    /// Decode a raw JSON request body and submit it.
    pub async fn submit_json(&self, body: &[u8]) -> Result<SubmitResult> {
        let record =
            AuditRecord::from_json(body).map_err(|e| ProxyError::MalformedRecord(e.to_string()))?;
        self.submit(&record).await
    }

    /// Commit `record` to a signed transaction and forward it.
    ///
    /// Any failure after the nonce is reserved cancels the reservation and
    /// leaves the tracked output unchanged. The same holds if the returned
    /// future is dropped before the forwarder answers.
    pub async fn submit(&self, record: &AuditRecord) -> Result<SubmitResult> {
        let payload = record
            .payload()
            .map_err(|e| ProxyError::MalformedRecord(e.to_string()))?;
        let record_hash = payload.record_hash;

        let lease = self.ledger.acquire().await.map_err(ProxyError::Ledger)?;
        let spend = lease.output();
        let nonce = self.nonces.reserve().map_err(ProxyError::Nonce)?;
        let in_flight = InFlight::new(&self.nonces, nonce, lease);
        debug!(nonce, record_hash = %record_hash, "reserved nonce for submission");

        let outcome = match self.prepare(nonce, spend, payload.bytes) {
            Ok(prepared) => self
                .forwarder
                .forward(&prepared.submission)
                .await
                .map(|()| prepared),
            Err(e) => Err(e),
        };

        let prepared = match outcome {
            Ok(prepared) => prepared,
            Err(e) => {
                in_flight.reject();
                error!(nonce, record_hash = %record_hash, error = %e, "submission failed");
                return Err(e);
            }
        };

        let transaction_id = prepared.submission.transaction_id;
        if let Err(e) = in_flight.accept(prepared.next_unspent) {
            // The remote already accepted the spend; the in-memory output has
            // advanced, only the file is stale.
            error!(tx_id = %transaction_id, error = %e, "failed to persist tracked output");
        }

        info!(
            nonce,
            tx_id = %transaction_id,
            fee = prepared.fee,
            output_id = %prepared.next_unspent.output_id,
            "submission accepted"
        );

        Ok(SubmitResult {
            record_hash,
            transaction_id,
            nonce,
            fee: prepared.fee,
        })
    }

    /// Build and sign the transaction. Synchronous so the RNG never lives
    /// across an await point.
    fn prepare(&self, nonce: u64, spend: UnspentOutput, payload: Vec<u8>) -> Result<Prepared> {
        let key = self.keys.key().map_err(ProxyError::Key)?;
        let built = TransactionBuilder::new(spend, key.public_key())
            .payload(payload)
            .policy(self.policy)
            .timestamp(now_secs())
            .build(&mut rand::thread_rng())?;

        let mut transaction = built.transaction;
        sign_transaction(&mut transaction, &key).map_err(ProxyError::Signing)?;

        let transaction_id = transaction.id()?;
        let body = transaction.to_canonical_json()?;
        debug!(nonce, tx_id = %transaction_id, fee = built.fee, "signed transaction");

        Ok(Prepared {
            submission: Submission {
                nonce,
                transaction_id,
                body: Bytes::from(body),
            },
            next_unspent: built.next_unspent,
            fee: built.fee,
        })
    }
}

/// A reserved nonce together with the lease on the output it spends.
///
/// Settled exactly once: accepted (lease committed, nonce kept) or rejected
/// (nonce cancelled, lease released). Dropping it unsettled rejects it, so a
/// cancelled request future cannot leave a gap in the sequence. The nonce is
/// always handed back before the lease is released.
struct InFlight<'a> {
    nonces: &'a NonceSequencer,
    nonce: u64,
    lease: Option<UtxoLease>,
}

impl<'a> InFlight<'a> {
    fn new(nonces: &'a NonceSequencer, nonce: u64, lease: UtxoLease) -> Self {
        Self {
            nonces,
            nonce,
            lease: Some(lease),
        }
    }

    fn accept(mut self, next: UnspentOutput) -> audittrail_store::Result<()> {
        match self.lease.take() {
            Some(lease) => lease.commit(next),
            None => Ok(()),
        }
    }

    fn reject(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(lease) = self.lease.take() {
            match self.nonces.cancel() {
                Ok(()) => warn!(nonce = self.nonce, "rolled back nonce reservation"),
                Err(e) => {
                    error!(nonce = self.nonce, error = %e, "failed to roll back nonce reservation")
                }
            }
            lease.abort();
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.lease.is_some() {
            warn!(nonce = self.nonce, "submission abandoned before the forwarder answered");
            self.release();
        }
    }
}

struct Prepared {
    submission: Submission,
    next_unspent: UnspentOutput,
    fee: i64,
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
