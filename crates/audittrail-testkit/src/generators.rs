//! Proptest generators for property-based testing.

use audittrail_core::{
    AuditDetail, AuditHeader, AuditRecord, FeePolicy, Hash256, Keypair, OutputData,
    TransactionOutput, UnspentOutput,
};
use bytes::Bytes;
use proptest::prelude::*;

/// Generate a random 256-bit value.
pub fn hash256() -> impl Strategy<Value = Hash256> {
    any::<[u8; 32]>().prop_map(Hash256::from_bytes)
}

/// Generate a non-empty set of 256-bit values.
pub fn hash_set(max_len: usize) -> impl Strategy<Value = Vec<Hash256>> {
    prop::collection::vec(hash256(), 1..=max_len.max(1))
}

/// Generate a keypair from a random valid scalar.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_filter_map("scalar out of range", |bytes| {
        Keypair::from_private_bytes(&bytes).ok()
    })
}

/// Generate a tracked output with a non-negative value.
pub fn unspent_output() -> impl Strategy<Value = UnspentOutput> {
    (hash256(), 0i64..=i64::MAX / 2).prop_map(|(id, value)| UnspentOutput::new(id, value))
}

/// Generate a fee policy with modest constants.
pub fn fee_policy() -> impl Strategy<Value = FeePolicy> {
    (0i64..=1_000, 0i64..=1_000).prop_map(|(rate_per_byte, payload_output_value)| FeePolicy {
        rate_per_byte,
        payload_output_value,
    })
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate output data with each field independently present or absent.
pub fn output_data() -> impl Strategy<Value = OutputData> {
    let field = || prop::option::of(payload(48).prop_map(Bytes::from));
    (field(), field(), field()).prop_map(|(contract, public_key, audit_data)| OutputData {
        contract,
        public_key,
        audit_data,
    })
}

/// Generate a transaction output.
pub fn transaction_output() -> impl Strategy<Value = TransactionOutput> {
    (any::<i64>(), any::<u64>(), output_data()).prop_map(|(value, nonce, data)| TransactionOutput {
        value,
        nonce,
        data,
    })
}

/// Generate an audit header field, including characters JSON must escape.
pub fn header_field() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_.@-]{0,24}",
        "\\PC{0,16}",
        Just("quote\"back\\slash".to_string()),
    ]
}

/// Generate an audit record.
pub fn audit_record() -> impl Strategy<Value = AuditRecord> {
    let detail =
        (header_field(), header_field()).prop_map(|(key, value)| AuditDetail { key, value });
    (
        header_field(),
        header_field(),
        header_field(),
        prop::option::of(prop::collection::vec(detail, 0..6)),
    )
        .prop_map(|(actor, intent, object, details)| AuditRecord {
            header: AuditHeader {
                actor,
                intent,
                object,
            },
            details,
        })
}
