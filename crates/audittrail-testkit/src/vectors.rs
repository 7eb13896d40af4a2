//! Golden test vectors for deterministic verification.
//!
//! These pin the identifier derivations the remote ledger recomputes. Any
//! change to canonical encoding, Merkle pairing, or hex formatting shows up
//! here first.

use audittrail_core::{
    merkle_root, AuditRecord, Hash256, Keypair, OutputData, Transaction, TransactionInput,
    TransactionOutput,
};

/// Private scalar used by the key vectors: 32 bytes of `0x42`.
pub const VECTOR_PRIVATE_KEY: [u8; 32] = [0x42; 32];

/// Uncompressed public key for [`VECTOR_PRIVATE_KEY`].
pub const VECTOR_PUBLIC_KEY_HEX: &str = "0424653eac434488002cc06bbfb7f10fe18991e35f9fe4302dbea6d2353dc0ab1c119fc5009a032aa9fe47f5e149bb8442f71f884ccb516590686d8ff6ab91c613";

/// Base64 address for [`VECTOR_PRIVATE_KEY`].
pub const VECTOR_ADDRESS: &str =
    "BCRlPqxDRIgALMBrv7fxD+GJkeNfn+QwLb6m0jU9wKscEZ/FAJoDKqn+R/XhSbuEQvcfiEzLUWWQaG2P9quRxhM=";

/// A Merkle root vector.
#[derive(Debug, Clone)]
pub struct MerkleVector {
    pub name: &'static str,
    /// Each leaf is 32 copies of the byte.
    pub leaves: &'static [u8],
    pub expected_root: &'static str,
}

/// Merkle vectors. Leaves are listed unsorted on purpose.
pub fn merkle_vectors() -> Vec<MerkleVector> {
    vec![
        MerkleVector {
            name: "single leaf pairs with itself",
            leaves: &[0x01],
            expected_root: "503e75d57e8f6665322cbf7a93315b578039373a10b2c498b8629a28f5fb10f4",
        },
        MerkleVector {
            name: "odd leaf count",
            leaves: &[0x03, 0x01, 0x02],
            expected_root: "0bc4e57b40da24e3bffefa6e871442c150c7c8df4105d944739210283cbeedbd",
        },
        MerkleVector {
            name: "three levels",
            leaves: &[0x05, 0x04, 0x03, 0x02, 0x01],
            expected_root: "0b382280563124e8eb51dd15f78ca07425ed2b51d3289f6931d1571f339cf79d",
        },
    ]
}

/// Leaves of a [`MerkleVector`] as hashes.
pub fn merkle_leaves(vector: &MerkleVector) -> Vec<Hash256> {
    vector
        .leaves
        .iter()
        .map(|b| Hash256::from_bytes([*b; 32]))
        .collect()
}

/// Identifiers of a fixed unsigned transaction.
#[derive(Debug, Clone)]
pub struct TransactionVector {
    pub payload_output_id: &'static str,
    pub change_output_id: &'static str,
    pub input_id: &'static str,
    pub output_set_root: &'static str,
    pub transaction_id: &'static str,
    pub signing_message: &'static str,
}

/// Expected identifiers for [`vector_transaction`].
pub fn transaction_vector() -> TransactionVector {
    TransactionVector {
        payload_output_id: "f65f8edec0b7e651d34d53b79d60adb4b4c5f5e9f55bf514bfb708a74e986817",
        change_output_id: "3cc378d7f61083cae3aeaed75a849e65373360096d801c39512726be857bac77",
        input_id: "a59663f5a7fbfe73b425905dacb3d236c5d22531d6b46d2235401f5dc6b73408",
        output_set_root: "97ae5dbcfa32a837362db4780f09721a55c6d9c4f5905e8ba41e25838ca4252c",
        transaction_id: "f5dd99f385846d82d3615d6f1bebc6212ee89234aa27d41eeb474c5c40b9fb3d",
        signing_message: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa97ae5dbcfa32a837362db4780f09721a55c6d9c4f5905e8ba41e25838ca4252c",
    }
}

/// The unsigned transaction the [`TransactionVector`] describes: spends
/// `0xaa..aa`, pays one unit to the payload `"audit"` (nonce 7) and
/// 99 990 000 in change to the vector key (nonce 8), at 1 700 000 000.
pub fn vector_transaction() -> Transaction {
    let public_key = vector_keypair().public_key();
    Transaction {
        inputs: vec![TransactionInput::new(Hash256::from_bytes([0xaa; 32]))],
        outputs: vec![
            TransactionOutput {
                value: 1,
                nonce: 7,
                data: OutputData::audit(b"audit".to_vec()),
            },
            TransactionOutput {
                value: 99_990_000,
                nonce: 8,
                data: OutputData::owned_by(public_key.as_bytes().to_vec()),
            },
        ],
        timestamp: 1_700_000_000,
    }
}

/// The vector keypair.
pub fn vector_keypair() -> Keypair {
    match Keypair::from_private_bytes(&VECTOR_PRIVATE_KEY) {
        Ok(keypair) => keypair,
        Err(e) => panic!("vector private key is invalid: {e}"),
    }
}

/// Record hash of the reference audit record.
pub const SAMPLE_RECORD_HASH: &str =
    "97b24f2e8964bdc07b1aeff47f9f454f7c628280809de6512bd38a2db0389f24";

/// A record canonicalization vector: raw request body, expected canonical
/// bytes and their hash.
#[derive(Debug, Clone)]
pub struct RecordVector {
    pub name: &'static str,
    pub input: &'static str,
    pub canonical: &'static str,
    pub record_hash: &'static str,
}

/// Record vectors pinning the string escaping and absent-field rules.
pub fn record_vectors() -> Vec<RecordVector> {
    vec![
        RecordVector {
            name: "markup, separators and control characters",
            input: r#"{"details":[{"v":"\b\f\n","k":"note"}],"header":{"actor":"a<b&c>","intent":"x\u2028y","object":"o"}}"#,
            canonical: r#"{"header":{"actor":"a\u003cb\u0026c\u003e","intent":"x\u2028y","object":"o"},"details":[{"k":"note","v":"\u0008\u000c\n"}]}"#,
            record_hash: "e6de6e23c2a90bcfd10c5666f1765116b82d31192354d8dcda6686762dfeef45",
        },
        RecordVector {
            name: "absent details",
            input: r#"{"header":{"actor":"alice","intent":"view","object":"doc1"}}"#,
            canonical: r#"{"header":{"actor":"alice","intent":"view","object":"doc1"},"details":null}"#,
            record_hash: "c16cc304060d6672a97d23254098af3c0d36d55e7d9d5cdb5c92ab688b4222b1",
        },
        RecordVector {
            name: "absent header",
            input: r#"{"details":[]}"#,
            canonical: r#"{"header":{"actor":"","intent":"","object":""},"details":[]}"#,
            record_hash: "3048b8b8a4950db150ffc801082b80e11129d6c1bea43b94d56171dc6aff80dc",
        },
    ]
}

/// Input identifier of an unsigned input spending the genesis output.
pub const GENESIS_INPUT_ID: &str =
    "781bc16cb5b54bfd9e23810836bb5409b3aad83447ce624781d218958e7fe9ea";

/// Check every vector, returning `(name, matches, actual)` triples.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results: Vec<(String, bool, String)> = merkle_vectors()
        .iter()
        .map(|v| {
            let actual = merkle_root(&merkle_leaves(v))
                .map(|root| root.to_hex())
                .unwrap_or_default();
            (v.name.to_string(), actual == v.expected_root, actual)
        })
        .collect();

    let expected = transaction_vector();
    let tx = vector_transaction();
    let actual = tx.id().map(|id| id.to_hex()).unwrap_or_default();
    results.push((
        "transaction id".to_string(),
        actual == expected.transaction_id,
        actual,
    ));

    let record = AuditRecord::from_json(crate::fixtures::SAMPLE_RECORD_JSON.as_bytes())
        .and_then(|r| r.record_hash())
        .map(|h| h.to_hex())
        .unwrap_or_default();
    results.push((
        "sample record hash".to_string(),
        record == SAMPLE_RECORD_HASH,
        record,
    ));

    for v in record_vectors() {
        let actual = AuditRecord::from_json(v.input.as_bytes())
            .and_then(|r| r.record_hash())
            .map(|h| h.to_hex())
            .unwrap_or_default();
        results.push((v.name.to_string(), actual == v.record_hash, actual));
    }

    results
}
