//! Audit records and the payload derived from them.
//!
//! A record is re-encoded canonically before hashing, so the record hash does
//! not depend on how the client formatted its JSON (key order, whitespace).
//!
//! Missing or `null` header fields decode as empty strings. `details` keeps
//! the distinction between absent (encoded as `null`) and empty (`[]`).

use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical::canonical_json;
use crate::crypto::sha256;
use crate::error::{CoreError, Result};
use crate::types::Hash256;

/// Length of the payload embedded in the audit output: four SHA-256 digests.
pub const AUDIT_PAYLOAD_LEN: usize = 4 * 32;

/// Who did what to which object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditHeader {
    #[serde(default, deserialize_with = "null_as_default")]
    pub actor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intent: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub object: String,
}

/// One free-form key/value detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetail {
    #[serde(rename = "k", default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(rename = "v", default, deserialize_with = "null_as_default")]
    pub value: String,
}

/// An audit record as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub header: AuditHeader,
    /// `None` when the client sent no details (or `null`).
    #[serde(default)]
    pub details: Option<Vec<AuditDetail>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AuditRecord {
    /// Parse a record from raw JSON request bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    /// Canonical JSON bytes of the record.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        canonical_json(self)
    }

    /// SHA-256 of the canonical bytes.
    pub fn record_hash(&self) -> Result<Hash256> {
        Ok(sha256(&self.canonical_bytes()?))
    }

    /// The bytes committed on the ledger:
    /// `H(actor) || H(intent) || H(object) || H(canonical record)`.
    pub fn payload(&self) -> Result<AuditPayload> {
        let record_hash = self.record_hash()?;
        let mut bytes = Vec::with_capacity(AUDIT_PAYLOAD_LEN);
        bytes.extend_from_slice(sha256(self.header.actor.as_bytes()).as_bytes());
        bytes.extend_from_slice(sha256(self.header.intent.as_bytes()).as_bytes());
        bytes.extend_from_slice(sha256(self.header.object.as_bytes()).as_bytes());
        bytes.extend_from_slice(record_hash.as_bytes());
        Ok(AuditPayload { record_hash, bytes })
    }
}

/// Payload derived from an [`AuditRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPayload {
    pub record_hash: Hash256,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERED: &str = r#"{"header":{"actor":"alice","intent":"view","object":"doc1"},"details":[{"k":"ip","v":"10.0.0.1"}]}"#;
    const SHUFFLED: &str = r#"{ "details": [ { "v": "10.0.0.1", "k": "ip" } ],
        "header": { "object": "doc1", "intent": "view", "actor": "alice" } }"#;

    #[test]
    fn test_canonical_form() {
        let record = AuditRecord::from_json(SHUFFLED.as_bytes()).unwrap();
        assert_eq!(record.canonical_bytes().unwrap(), ORDERED.as_bytes());
    }

    #[test]
    fn test_formatting_does_not_change_hash() {
        let a = AuditRecord::from_json(ORDERED.as_bytes()).unwrap();
        let b = AuditRecord::from_json(SHUFFLED.as_bytes()).unwrap();
        assert_eq!(a.record_hash().unwrap(), b.record_hash().unwrap());
        assert_eq!(a.record_hash().unwrap(), sha256(ORDERED.as_bytes()));
    }

    #[test]
    fn test_detail_order_matters() {
        let a = AuditRecord::from_json(
            br#"{"header":{"actor":"a","intent":"b","object":"c"},"details":[{"k":"1","v":"x"},{"k":"2","v":"y"}]}"#,
        )
        .unwrap();
        let b = AuditRecord::from_json(
            br#"{"header":{"actor":"a","intent":"b","object":"c"},"details":[{"k":"2","v":"y"},{"k":"1","v":"x"}]}"#,
        )
        .unwrap();
        assert_ne!(a.record_hash().unwrap(), b.record_hash().unwrap());
    }

    #[test]
    fn test_payload_layout() {
        let record = AuditRecord::from_json(ORDERED.as_bytes()).unwrap();
        let payload = record.payload().unwrap();
        assert_eq!(payload.bytes.len(), AUDIT_PAYLOAD_LEN);
        assert_eq!(&payload.bytes[..32], sha256(b"alice").as_bytes());
        assert_eq!(&payload.bytes[32..64], sha256(b"view").as_bytes());
        assert_eq!(&payload.bytes[64..96], sha256(b"doc1").as_bytes());
        assert_eq!(&payload.bytes[96..], payload.record_hash.as_bytes());
    }

    #[test]
    fn test_missing_details_encode_as_null() {
        for json in [
            &br#"{"header":{"actor":"a","intent":"b","object":"c"}}"#[..],
            &br#"{"header":{"actor":"a","intent":"b","object":"c"},"details":null}"#[..],
        ] {
            let record = AuditRecord::from_json(json).unwrap();
            assert_eq!(record.details, None);
            assert_eq!(
                record.canonical_bytes().unwrap(),
                br#"{"header":{"actor":"a","intent":"b","object":"c"},"details":null}"#.to_vec()
            );
        }
    }

    #[test]
    fn test_empty_details_stay_empty() {
        let record = AuditRecord::from_json(
            br#"{"header":{"actor":"a","intent":"b","object":"c"},"details":[]}"#,
        )
        .unwrap();
        assert_eq!(record.details, Some(Vec::new()));
        assert_eq!(
            record.canonical_bytes().unwrap(),
            br#"{"header":{"actor":"a","intent":"b","object":"c"},"details":[]}"#.to_vec()
        );
    }

    #[test]
    fn test_missing_header_fields_are_empty() {
        let expected = br#"{"header":{"actor":"","intent":"","object":""},"details":[]}"#;
        for json in [
            &br#"{"details":[]}"#[..],
            &br#"{"header":null,"details":[]}"#[..],
            &br#"{"header":{"actor":null},"details":[]}"#[..],
        ] {
            let record = AuditRecord::from_json(json).unwrap();
            assert_eq!(record.header, AuditHeader::default());
            assert_eq!(record.canonical_bytes().unwrap(), expected.to_vec());
        }
    }

    #[test]
    fn test_markup_in_fields_is_escaped() {
        let record = AuditRecord::from_json(
            br#"{"header":{"actor":"a<b&c>","intent":"i","object":"o"}}"#,
        )
        .unwrap();
        assert_eq!(
            record.canonical_bytes().unwrap(),
            br#"{"header":{"actor":"a\u003cb\u0026c\u003e","intent":"i","object":"o"},"details":null}"#
                .to_vec()
        );
        // The header digests cover the raw text, not its escaped form.
        assert_eq!(&record.payload().unwrap().bytes[..32], sha256(b"a<b&c>").as_bytes());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            AuditRecord::from_json(b"{not json"),
            Err(CoreError::DecodingError(_))
        ));
        assert!(AuditRecord::from_json(br#"{"header":"alice"}"#).is_err());
        assert!(AuditRecord::from_json(br#"{"details":{}}"#).is_err());
    }
}
