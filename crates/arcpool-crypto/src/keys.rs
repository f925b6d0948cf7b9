use arcpool_core::Address;
use libsecp256k1::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::hashing::keccak256;

/// secp256k1 key pair used by the pricing signer.
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = PublicKey::from_secret_key(&secret);
        Self { secret, public }
    }

    /// Create a key pair from raw secret bytes (32 bytes, big-endian scalar).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let parsed = SecretKey::parse(&seed);
        seed.zeroize();
        let secret = parsed.map_err(|e| CryptoError::InvalidSecretKey(format!("{:?}", e)))?;
        let public = PublicKey::from_secret_key(&secret);
        Ok(Self { secret, public })
    }

    /// Decode a hex secret key, with or without the `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let mut bytes = hex::decode(trimmed)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid hex: {}", e)))?;
        let kp = Self::from_bytes(&bytes);
        bytes.zeroize();
        kp
    }

    /// The account address controlled by this key.
    pub fn address(&self) -> Address {
        address_from_public_key(&self.public)
    }

    /// Uncompressed SEC1 public key (65 bytes, `0x04` prefix).
    pub fn public_key_bytes(&self) -> [u8; 65] {
        self.public.serialize()
    }

    /// Raw secret bytes. Prefer the signing functions over exporting these.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.serialize()
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Address = last 20 bytes of `keccak256(x ‖ y)` of the uncompressed key.
pub fn address_from_public_key(public: &PublicKey) -> Address {
    let uncompressed = public.serialize();
    let digest = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address::new(out)
}
