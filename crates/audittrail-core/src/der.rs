//! ASN.1 DER encoding of ECDSA signature pairs.
//!
//! Layout: `0x30 len 0x02 len(R) R 0x02 len(S) S`, where each integer is its
//! minimal big-endian form, prefixed with `0x00` when the top bit is set so it
//! stays non-negative.
//!
//! **CRITICAL**: the remote ledger parses exactly this layout.

use crate::error::{CoreError, Result};

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;

/// Make a big-endian integer a valid non-negative DER INTEGER body.
fn prefix_point(b: &[u8]) -> Vec<u8> {
    if b.is_empty() {
        return vec![0x00];
    }
    if b[0] & 0x80 != 0 {
        let mut padded = Vec::with_capacity(b.len() + 1);
        padded.push(0x00);
        padded.extend_from_slice(b);
        return padded;
    }
    b.to_vec()
}

/// Encode the signature pair `(r, s)` as a DER SEQUENCE of two INTEGERs.
///
/// Inputs are minimal big-endian integers of at most 32 bytes.
pub fn points_to_der(r: &[u8], s: &[u8]) -> Vec<u8> {
    let rb = prefix_point(r);
    let sb = prefix_point(s);

    let length = 2 + rb.len() + 2 + sb.len();

    let mut der = Vec::with_capacity(2 + length);
    der.push(SEQUENCE_TAG);
    der.push(length as u8);
    der.push(INTEGER_TAG);
    der.push(rb.len() as u8);
    der.extend_from_slice(&rb);
    der.push(INTEGER_TAG);
    der.push(sb.len() as u8);
    der.extend_from_slice(&sb);
    der
}

/// Decode a DER signature back into its minimal `(r, s)` integers.
pub fn der_to_points(der: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if der.len() < 2 || der[0] != SEQUENCE_TAG {
        return Err(CoreError::MalformedDer("expected SEQUENCE".into()));
    }
    if der[1] as usize != der.len() - 2 {
        return Err(CoreError::MalformedDer(format!(
            "sequence length {} does not match body length {}",
            der[1],
            der.len() - 2
        )));
    }

    let mut offset = 2;
    let r = read_integer(der, &mut offset)?;
    let s = read_integer(der, &mut offset)?;
    if offset != der.len() {
        return Err(CoreError::MalformedDer("trailing bytes".into()));
    }
    Ok((r, s))
}

fn read_integer(der: &[u8], offset: &mut usize) -> Result<Vec<u8>> {
    if der.len() < *offset + 2 || der[*offset] != INTEGER_TAG {
        return Err(CoreError::MalformedDer("expected INTEGER".into()));
    }
    let len = der[*offset + 1] as usize;
    let start = *offset + 2;
    let end = start + len;
    if len == 0 || end > der.len() {
        return Err(CoreError::MalformedDer("bad INTEGER length".into()));
    }
    let body = &der[start..end];
    *offset = end;

    if body[0] & 0x80 != 0 {
        return Err(CoreError::MalformedDer("negative INTEGER".into()));
    }
    if body.len() > 1 && body[0] == 0x00 {
        if body[1] & 0x80 == 0 {
            return Err(CoreError::MalformedDer("non-minimal INTEGER".into()));
        }
        return Ok(body[1..].to_vec());
    }
    Ok(body.to_vec())
}
