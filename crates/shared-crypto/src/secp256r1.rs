//! # secp256r1 (P-256)
//!
//! WebAuthn authenticators return ASN.1 DER signatures; the account
//! contract expects raw, low-S `r ∥ s`.

use p256::ecdsa::Signature;

use crate::errors::CryptoError;

/// Convert a DER-encoded P-256 signature to 64 raw bytes with low S.
pub fn secp256r1_signature_from_der(der: &[u8]) -> Result<[u8; 64], CryptoError> {
    let signature = Signature::from_der(der).map_err(|_| CryptoError::InvalidSignatureFormat)?;
    let normalized = signature.normalize_s().unwrap_or(signature);
    Ok(normalized.to_bytes().into())
}
