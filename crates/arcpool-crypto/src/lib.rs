pub mod error;
pub mod hashing;
pub mod keys;
pub mod signing;
pub mod typed_data;

pub use error::CryptoError;
pub use hashing::{invoice_id, keccak256, Hash};
pub use keys::{address_from_public_key, KeyPair};
pub use signing::{recover, sign_digest, RecoverableSignature};
pub use typed_data::{
    recover_financing_signer, sign_financing_request, FinancingRequest, TypedDataDomain,
};
