//! Transaction construction.
//!
//! Every transaction spends the single tracked output and creates exactly two
//! outputs: the audit payload output and a change output owned by this
//! installation's public key. The change output becomes the next tracked
//! output.

use bytes::Bytes;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::PublicKeyBytes;
use crate::error::{CoreError, Result};
use crate::transaction::{OutputData, Transaction, TransactionInput, TransactionOutput};
use crate::types::UnspentOutput;

/// Fee units charged per byte of canonical input/output data.
pub const DEFAULT_FEE_RATE: i64 = 100;

/// Value placed on the payload output.
pub const DEFAULT_PAYLOAD_OUTPUT_VALUE: i64 = 1;

/// Fee and value policy. Both numbers must match what the receiving ledger
/// expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeePolicy {
    pub rate_per_byte: i64,
    pub payload_output_value: i64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            rate_per_byte: DEFAULT_FEE_RATE,
            payload_output_value: DEFAULT_PAYLOAD_OUTPUT_VALUE,
        }
    }
}

/// A constructed (unsigned) transaction and the output it leaves spendable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub transaction: Transaction,
    pub fee: i64,
    /// The change output, to be tracked once the transaction is accepted.
    pub next_unspent: UnspentOutput,
}

/// Builder for the spend-and-change transaction.
pub struct TransactionBuilder {
    spend: UnspentOutput,
    public_key: PublicKeyBytes,
    payload: Bytes,
    policy: FeePolicy,
    timestamp: i64,
}

impl TransactionBuilder {
    /// Start building a transaction spending `spend`, with change returned to
    /// `public_key`.
    pub fn new(spend: UnspentOutput, public_key: PublicKeyBytes) -> Self {
        Self {
            spend,
            public_key,
            payload: Bytes::new(),
            policy: FeePolicy::default(),
            timestamp: 0,
        }
    }

    /// Set the audit payload.
    pub fn payload(mut self, p: impl Into<Bytes>) -> Self {
        self.payload = p.into();
        self
    }

    /// Set the fee policy.
    pub fn policy(mut self, policy: FeePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the timestamp (Unix seconds).
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    /// Build the transaction, drawing output nonces from `rng`.
    ///
    /// Fails with [`CoreError::InsufficientFunds`] when the tracked value
    /// cannot cover the fee and the payload output.
    pub fn build<R: RngCore + ?Sized>(self, rng: &mut R) -> Result<BuiltTransaction> {
        if self.policy.rate_per_byte < 0 || self.policy.payload_output_value < 0 {
            return Err(CoreError::EncodingError(format!(
                "fee policy values must be non-negative: {:?}",
                self.policy
            )));
        }

        let payload_output = TransactionOutput {
            value: self.policy.payload_output_value,
            nonce: rng.next_u64(),
            data: OutputData::audit(self.payload),
        };
        let change_output = TransactionOutput {
            value: self.spend.value,
            nonce: rng.next_u64(),
            data: OutputData::owned_by(self.public_key.as_bytes().to_vec()),
        };

        let mut transaction = Transaction {
            inputs: vec![TransactionInput::new(self.spend.output_id)],
            outputs: vec![payload_output, change_output],
            timestamp: self.timestamp,
        };

        // The fee only depends on data, so it is final before values are set.
        let fee = transaction.fee(self.policy.rate_per_byte)?;
        let insufficient = || CoreError::InsufficientFunds {
            available: self.spend.value,
            fee,
            payload_value: self.policy.payload_output_value,
        };
        let change = self
            .spend
            .value
            .checked_sub(fee)
            .and_then(|v| v.checked_sub(self.policy.payload_output_value))
            .ok_or_else(insufficient)?;
        if change < 0 {
            return Err(insufficient());
        }

        transaction.outputs[1].value = change;
        let next_unspent = UnspentOutput::new(transaction.outputs[1].id()?, change);

        Ok(BuiltTransaction {
            transaction,
            fee,
            next_unspent,
        })
    }
}
