use arcpool_core::Address;
use libsecp256k1::{Message, RecoveryId, Signature};
use std::fmt;
use std::str::FromStr;

use crate::error::CryptoError;
use crate::hashing::Hash;
use crate::keys::{address_from_public_key, KeyPair};

/// 65-byte recoverable ECDSA signature laid out as `r ‖ s ‖ v`.
///
/// `v` is stored in the 27/28 convention used by wallet signers; parsing also
/// accepts the raw 0/1 recovery ids.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; 65]);

impl RecoverableSignature {
    pub const LEN: usize = 65;

    /// Parse and canonicalise the recovery byte. Rejects malleable high-`s`
    /// signatures.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::LEN {
            return Err(CryptoError::MalformedSignature(format!(
                "signature must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut arr = [0u8; 65];
        arr.copy_from_slice(bytes);
        arr[64] = match arr[64] {
            0 | 27 => 27,
            1 | 28 => 28,
            other => {
                return Err(CryptoError::MalformedSignature(format!(
                    "invalid recovery byte {}",
                    other
                )))
            }
        };
        let sig = Self(arr);
        let (inner, _) = sig.parts()?;
        if inner.s.is_high() {
            return Err(CryptoError::MalformedSignature(
                "non-canonical high-s value".into(),
            ));
        }
        Ok(sig)
    }

    /// Decode from `0x`-prefixed (or bare) hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed)
            .map_err(|e| CryptoError::MalformedSignature(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Recovery byte in the 27/28 convention.
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    fn parts(&self) -> Result<(Signature, RecoveryId), CryptoError> {
        let mut rs = [0u8; 64];
        rs.copy_from_slice(&self.0[..64]);
        let inner = Signature::parse_standard(&rs)
            .map_err(|e| CryptoError::MalformedSignature(format!("{:?}", e)))?;
        let recovery_id = RecoveryId::parse(self.0[64] - 27)
            .map_err(|e| CryptoError::MalformedSignature(format!("{:?}", e)))?;
        Ok((inner, recovery_id))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for RecoverableSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl serde::Serialize for RecoverableSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Sign a 32-byte digest. The signer emits low-`s` signatures.
pub fn sign_digest(digest: &Hash, keypair: &KeyPair) -> RecoverableSignature {
    let message = Message::parse(digest);
    let (sig, recovery_id) = libsecp256k1::sign(&message, keypair.secret_key());
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.serialize());
    out[64] = recovery_id.serialize() + 27;
    RecoverableSignature(out)
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover(digest: &Hash, signature: &RecoverableSignature) -> Result<Address, CryptoError> {
    let (sig, recovery_id) = signature.parts()?;
    let message = Message::parse(digest);
    let public = libsecp256k1::recover(&message, &sig, &recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(format!("{:?}", e)))?;
    Ok(address_from_public_key(&public))
}
