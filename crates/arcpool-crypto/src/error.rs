/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
