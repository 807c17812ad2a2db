//! zero-knowledge proof verification seam
//!
//! the proof system is external. the pool only needs a deterministic
//! predicate over (verification key, proof, primary inputs).

use serde::{Deserialize, Serialize};

use crate::FieldElement;

/// verification key of the mixing circuit (opaque bytes)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationKey(#[serde(with = "hex::serde")] pub Vec<u8>);

impl VerificationKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// serialized proof (opaque bytes)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Proof(pub Vec<u8>);

impl Proof {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// pluggable proof predicate
///
/// implementations must be pure: same arguments, same answer, no side effects
pub trait ProofVerifier {
    fn verify(&self, vk: &VerificationKey, proof: &Proof, public_inputs: &[FieldElement]) -> bool;
}

impl<F> ProofVerifier for F
where
    F: Fn(&VerificationKey, &Proof, &[FieldElement]) -> bool,
{
    fn verify(&self, vk: &VerificationKey, proof: &Proof, public_inputs: &[FieldElement]) -> bool {
        self(vk, proof, public_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_verifier() {
        let accept_nonempty = |_: &VerificationKey, proof: &Proof, _: &[FieldElement]| {
            !proof.as_bytes().is_empty()
        };

        let vk = VerificationKey::new(vec![1, 2, 3]);
        assert!(accept_nonempty.verify(&vk, &Proof::new(vec![9]), &[]));
        assert!(!accept_nonempty.verify(&vk, &Proof::default(), &[]));
    }
}
