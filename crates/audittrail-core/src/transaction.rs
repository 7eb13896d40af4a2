//! Transaction model and identifier derivation.
//!
//! A transaction spends existing outputs (inputs) and creates new ones
//! (outputs). Identifiers are content addresses:
//!
//! - input:  `SHA-256(outputId || json(data))`
//! - output: `SHA-256(value || nonce || json(data))`, decimal integers
//! - transaction: `SHA-256(inputSetRoot || outputSetRoot || timestamp)`, roots
//!   as minimal hex, `inputSetRoot` empty when there are no inputs
//!
//! where `json` is the canonical encoding from [`crate::canonical`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::{base64_bytes, canonical_json};
use crate::crypto::sha256;
use crate::error::{CoreError, Result};
use crate::merkle::merkle_root;
use crate::types::Hash256;

/// Data attached to an input. The signature is present only after signing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputData {
    /// Base64 DER signature over the input's signing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A reference to the output being spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub output_id: Hash256,
    pub data: InputData,
}

impl TransactionInput {
    /// An unsigned input spending `output_id`.
    pub fn new(output_id: Hash256) -> Self {
        Self {
            output_id,
            data: InputData::default(),
        }
    }

    /// Compute the input identifier.
    pub fn id(&self) -> Result<Hash256> {
        let mut hash_input = self.output_id.to_hex().into_bytes();
        hash_input.extend_from_slice(&canonical_json(&self.data)?);
        Ok(sha256(&hash_input))
    }

    /// Whether a signature has been attached.
    pub fn is_signed(&self) -> bool {
        self.data.signature.is_some()
    }
}

/// Data attached to an output. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputData {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub contract: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub public_key: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub audit_data: Option<Bytes>,
}

impl OutputData {
    /// Output data carrying an audit payload.
    pub fn audit(payload: impl Into<Bytes>) -> Self {
        Self {
            audit_data: Some(payload.into()),
            ..Self::default()
        }
    }

    /// Output data locking the value to a public key.
    pub fn owned_by(public_key: impl Into<Bytes>) -> Self {
        Self {
            public_key: Some(public_key.into()),
            ..Self::default()
        }
    }
}

/// A newly created output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: i64,
    /// Random value that decorrelates otherwise identical outputs.
    pub nonce: u64,
    pub data: OutputData,
}

impl TransactionOutput {
    /// Compute the output identifier.
    pub fn id(&self) -> Result<Hash256> {
        let mut hash_input = format!("{}{}", self.value, self.nonce).into_bytes();
        hash_input.extend_from_slice(&canonical_json(&self.data)?);
        Ok(sha256(&hash_input))
    }
}

/// A ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    /// Unix seconds at construction.
    pub timestamp: i64,
}

impl Transaction {
    /// Merkle root over the input identifiers, `None` without inputs.
    pub fn input_set_id(&self) -> Result<Option<Hash256>> {
        if self.inputs.is_empty() {
            return Ok(None);
        }
        let ids = self
            .inputs
            .iter()
            .map(TransactionInput::id)
            .collect::<Result<Vec<_>>>()?;
        merkle_root(&ids).map(Some)
    }

    /// Merkle root over the output identifiers.
    pub fn output_set_id(&self) -> Result<Hash256> {
        let ids = self
            .outputs
            .iter()
            .map(TransactionOutput::id)
            .collect::<Result<Vec<_>>>()?;
        merkle_root(&ids)
    }

    /// Compute the transaction identifier.
    pub fn id(&self) -> Result<Hash256> {
        let input_set = match self.input_set_id()? {
            Some(root) => root.to_int_hex(),
            None => String::new(),
        };
        let output_set = self.output_set_id()?.to_int_hex();
        let hash_input = format!("{}{}{}", input_set, output_set, self.timestamp);
        Ok(sha256(hash_input.as_bytes()))
    }

    /// The message an input signs: `outputId || outputSetRoot`.
    ///
    /// Binding every input to the whole output set means no output can be
    /// altered without invalidating all input signatures.
    pub fn signing_message(&self, index: usize) -> Result<Vec<u8>> {
        let input = self.inputs.get(index).ok_or_else(|| {
            CoreError::MalformedIdentifier(format!("no input at index {}", index))
        })?;
        let output_set = self.output_set_id()?;
        Ok(format!("{}{}", input.output_id.to_hex(), output_set.to_int_hex()).into_bytes())
    }

    /// Network fee: canonical `data` length of every input and output times
    /// `rate_per_byte`.
    pub fn fee(&self, rate_per_byte: i64) -> Result<i64> {
        let mut bytes = 0usize;
        for input in &self.inputs {
            bytes += canonical_json(&input.data)?.len();
        }
        for output in &self.outputs {
            bytes += canonical_json(&output.data)?.len();
        }
        (bytes as i64)
            .checked_mul(rate_per_byte)
            .ok_or_else(|| CoreError::EncodingError("fee overflows i64".into()))
    }

    /// Whether every input carries a signature.
    pub fn is_fully_signed(&self) -> bool {
        self.inputs.iter().all(TransactionInput::is_signed)
    }

    /// Canonical JSON of the whole transaction, as forwarded.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>> {
        canonical_json(self)
    }
}
