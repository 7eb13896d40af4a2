//! Cryptographic primitives: SHA-256 hashing and secp256k1 ECDSA signing.
//!
//! Wraps `sha2` and `k256` with strong types. Signatures are produced over a
//! SHA-256 prehash and leave this module DER-encoded (see [`crate::der`]).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::FieldBytes;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::der::{der_to_points, points_to_der};
use crate::error::{CoreError, Result};
use crate::types::Hash256;

/// Width of one affine coordinate and of the private scalar.
pub const COORDINATE_LEN: usize = 32;

/// Width of an uncompressed SEC1 public key: `0x04 || X || Y`.
pub const PUBLIC_KEY_LEN: usize = 1 + 2 * COORDINATE_LEN;

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

/// Append `src` to `dst`, left-padding with zeros up to `size` bytes.
fn padded_append(size: usize, dst: &mut Vec<u8>, src: &[u8]) {
    for _ in src.len()..size {
        dst.push(0);
    }
    dst.extend_from_slice(src);
}

/// Encode a public key from its big-endian affine coordinates.
///
/// Coordinates shorter than 32 bytes are left-padded, so the result is always
/// 65 bytes starting with `0x04`.
pub fn serialize_public_key(x: &[u8], y: &[u8]) -> PublicKeyBytes {
    let mut b = Vec::with_capacity(PUBLIC_KEY_LEN);
    b.push(0x04);
    padded_append(COORDINATE_LEN, &mut b, x);
    padded_append(COORDINATE_LEN, &mut b, y);
    let mut arr = [0u8; PUBLIC_KEY_LEN];
    arr.copy_from_slice(&b[..PUBLIC_KEY_LEN]);
    PublicKeyBytes(arr)
}

/// An uncompressed secp256k1 public key (65 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKeyBytes(pub [u8; PUBLIC_KEY_LEN]);

impl PublicKeyBytes {
    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// The wire address: standard base64 of the 65 key bytes.
    pub fn address(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a base64 DER signature over the SHA-256 digest of `message`.
    pub fn verify(&self, message: &[u8], signature_base64: &str) -> Result<()> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;

        let der = STANDARD
            .decode(signature_base64)
            .map_err(|e| CoreError::DecodingError(e.to_string()))?;
        let (r, s) = der_to_points(&der)?;
        let sig = Signature::from_scalars(scalar_bytes(&r)?, scalar_bytes(&s)?)
            .map_err(|_| CoreError::InvalidSignature)?;

        let digest = sha256(message);
        verifying_key
            .verify_prehash(digest.as_bytes(), &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PublicKeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Left-pad a minimal big-endian integer into a 32-byte field element.
fn scalar_bytes(minimal: &[u8]) -> Result<FieldBytes> {
    if minimal.len() > COORDINATE_LEN {
        return Err(CoreError::InvalidSignature);
    }
    let mut out = FieldBytes::default();
    out[COORDINATE_LEN - minimal.len()..].copy_from_slice(minimal);
    Ok(out)
}

/// Strip leading zero bytes, keeping at least one byte.
fn minimal_bytes(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    &bytes[start..]
}

/// The installation's signing keypair.
///
/// This wraps k256's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair from the OS random source.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        Self { signing_key }
    }

    /// Load from a big-endian private scalar (exactly 32 bytes).
    pub fn from_private_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COORDINATE_LEN {
            return Err(CoreError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                COORDINATE_LEN,
                bytes.len()
            )));
        }
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|e| CoreError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// The private scalar, left-zero-padded to 32 bytes.
    pub fn private_bytes(&self) -> [u8; COORDINATE_LEN] {
        let mut out = [0u8; COORDINATE_LEN];
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }

    /// Standard base64 of [`Keypair::private_bytes`].
    pub fn private_key_base64(&self) -> String {
        STANDARD.encode(self.private_bytes())
    }

    /// Get the uncompressed public key.
    pub fn public_key(&self) -> PublicKeyBytes {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let x = point.x().map(|x| x.as_slice()).unwrap_or_default();
        let y = point.y().map(|y| y.as_slice()).unwrap_or_default();
        serialize_public_key(x, y)
    }

    /// Get the wire address of the public key.
    pub fn address(&self) -> String {
        self.public_key().address()
    }

    /// Sign the SHA-256 digest of `message`, returning base64 of the DER
    /// encoding.
    pub fn sign(&self, message: &[u8]) -> Result<String> {
        let digest = sha256(message);
        let sig: Signature = self
            .signing_key
            .sign_prehash(digest.as_bytes())
            .map_err(|e| CoreError::Signing(e.to_string()))?;
        let (r, s) = sig.split_bytes();
        let der = points_to_der(minimal_bytes(&r), minimal_bytes(&s));
        Ok(STANDARD.encode(der))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}
