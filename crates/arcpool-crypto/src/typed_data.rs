//! EIP-712 typed-data hashing for financing authorizations.
//!
//! The pricing signer produces `signTypedData` signatures over a
//! `FinancingRequest` bound to the pool's domain; this module reproduces the
//! digest bit-for-bit so the ledger can recover the signer.

use arcpool_core::{Address, InvoiceId, PoolConfig, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::hashing::{keccak256, keccak256_concat, Hash};
use crate::keys::KeyPair;
use crate::signing::{recover, sign_digest, RecoverableSignature};

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const FINANCING_REQUEST_TYPE: &str = "FinancingRequest(bytes32 invoiceId,address supplier,uint256 payoutAmount,uint256 repaymentAmount,uint256 dueDate,uint256 nonce,uint256 deadline)";

fn word_u128(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_u64(value: u64) -> [u8; 32] {
    word_u128(value as u128)
}

fn word_address(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Domain binding that prevents replaying a signature on another pool or chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl TypedDataDomain {
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: "ArcPool".into(),
            version: "1".into(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
            chain_id: config.chain_id,
            verifying_contract: config.pool_address,
        }
    }

    /// `hashStruct(EIP712Domain)`.
    pub fn separator(&self) -> Hash {
        keccak256_concat(&[
            &keccak256(DOMAIN_TYPE.as_bytes()),
            &keccak256(self.name.as_bytes()),
            &keccak256(self.version.as_bytes()),
            &word_u64(self.chain_id),
            &word_address(&self.verifying_contract),
        ])
    }
}

/// The signed financing terms for one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingRequest {
    pub invoice_id: InvoiceId,
    pub supplier: Address,
    #[serde(with = "arcpool_core::types::amount_string")]
    pub payout_amount: u128,
    #[serde(with = "arcpool_core::types::amount_string")]
    pub repayment_amount: u128,
    pub due_date: Timestamp,
    #[serde(with = "arcpool_core::types::amount_string")]
    pub nonce: u128,
    pub deadline: Timestamp,
}

impl FinancingRequest {
    pub fn type_hash() -> Hash {
        keccak256(FINANCING_REQUEST_TYPE.as_bytes())
    }

    /// `hashStruct(FinancingRequest)`.
    pub fn struct_hash(&self) -> Hash {
        keccak256_concat(&[
            &Self::type_hash(),
            self.invoice_id.as_bytes(),
            &word_address(&self.supplier),
            &word_u128(self.payout_amount),
            &word_u128(self.repayment_amount),
            &word_u64(self.due_date),
            &word_u128(self.nonce),
            &word_u64(self.deadline),
        ])
    }

    /// `keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ hashStruct(message))`.
    pub fn signing_digest(&self, domain: &TypedDataDomain) -> Hash {
        keccak256_concat(&[&[0x19, 0x01], &domain.separator(), &self.struct_hash()])
    }
}

/// Sign a financing request as the pricing signer would.
pub fn sign_financing_request(
    request: &FinancingRequest,
    domain: &TypedDataDomain,
    keypair: &KeyPair,
) -> RecoverableSignature {
    let signature = sign_digest(&request.signing_digest(domain), keypair);
    tracing::debug!(
        invoice_id = %request.invoice_id,
        signer = %keypair.address(),
        "signed financing request"
    );
    signature
}

/// Recover the address that signed `request` under `domain`.
pub fn recover_financing_signer(
    request: &FinancingRequest,
    domain: &TypedDataDomain,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    recover(&request.signing_digest(domain), signature)
}
