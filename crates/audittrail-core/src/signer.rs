//! Transaction signing and verification.

use crate::crypto::{Keypair, PublicKeyBytes};
use crate::error::{CoreError, Result};
use crate::transaction::Transaction;

/// Sign every input of `tx`.
///
/// Signatures are computed first and attached only once all succeed, so a
/// failure leaves `tx` untouched.
pub fn sign_transaction(tx: &mut Transaction, keypair: &Keypair) -> Result<()> {
    let signatures = (0..tx.inputs.len())
        .map(|index| keypair.sign(&tx.signing_message(index)?))
        .collect::<Result<Vec<_>>>()?;

    for (input, signature) in tx.inputs.iter_mut().zip(signatures) {
        input.data.signature = Some(signature);
    }
    Ok(())
}

/// Verify one base64 DER signature over `message`.
pub fn verify_signature(
    public_key: &PublicKeyBytes,
    message: &[u8],
    signature: &str,
) -> Result<()> {
    public_key.verify(message, signature)
}

/// Verify every input signature of `tx` against `public_key`.
pub fn verify_transaction(tx: &Transaction, public_key: &PublicKeyBytes) -> Result<()> {
    for (index, input) in tx.inputs.iter().enumerate() {
        let signature = input
            .data
            .signature
            .as_deref()
            .ok_or(CoreError::InvalidSignature)?;
        verify_signature(public_key, &tx.signing_message(index)?, signature)?;
    }
    Ok(())
}
