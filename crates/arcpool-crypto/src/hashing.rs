use arcpool_core::InvoiceId;
use sha3::{Digest, Keccak256};

/// Keccak-256 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using Keccak-256 (the pre-standard SHA-3 padding).
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over the concatenation of several byte strings.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Derive the invoice id from an external invoice reference string.
///
/// Matches the pricing service, which hashes the UTF-8 reference.
pub fn invoice_id(reference: &str) -> InvoiceId {
    InvoiceId::new(keccak256(reference.as_bytes()))
}
