use arcpool_core::{Address, Timestamp};
use arcpool_crypto::{recover_financing_signer, FinancingRequest, RecoverableSignature, TypedDataDomain};
use serde::{Deserialize, Serialize};

use crate::error::AuthorizationError;

/// Checks financing authorizations against the pool's trusted pricing signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationVerifier {
    domain: TypedDataDomain,
    trusted_signer: Address,
}

impl AuthorizationVerifier {
    pub fn new(domain: TypedDataDomain, trusted_signer: Address) -> Self {
        Self {
            domain,
            trusted_signer,
        }
    }

    pub fn domain(&self) -> &TypedDataDomain {
        &self.domain
    }

    pub fn trusted_signer(&self) -> Address {
        self.trusted_signer
    }

    /// Replace the trusted signer, returning the previous one.
    pub(crate) fn set_trusted_signer(&mut self, signer: Address) -> Address {
        std::mem::replace(&mut self.trusted_signer, signer)
    }

    /// Verify `signature` over `request`. The deadline is checked before the
    /// signature. Returns the recovered signer.
    pub fn verify(
        &self,
        request: &FinancingRequest,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<Address, AuthorizationError> {
        if request.deadline < now {
            return Err(AuthorizationError::Expired {
                deadline: request.deadline,
                now,
            });
        }
        let signature = RecoverableSignature::from_bytes(signature)
            .map_err(|e| AuthorizationError::MalformedSignature(e.to_string()))?;
        let recovered = recover_financing_signer(request, &self.domain, &signature)
            .map_err(|e| AuthorizationError::MalformedSignature(e.to_string()))?;
        if recovered != self.trusted_signer {
            return Err(AuthorizationError::InvalidSigner {
                expected: self.trusted_signer,
                recovered,
            });
        }
        Ok(recovered)
    }
}
