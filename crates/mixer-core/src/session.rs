//! session digest
//!
//! binds the nullifiers of one mix to the verification key, so a proof and
//! its nullifiers cannot be replayed under a different key set.

use blake2::{Blake2s256, Digest as _};

use crate::verifier::VerificationKey;
use crate::Digest;

/// blake2s-256(nf_0 || ... || nf_{n-1} || vk)
pub fn session_digest(nullifiers: &[Digest], vk: &VerificationKey) -> Digest {
    let mut hasher = Blake2s256::new();
    for nf in nullifiers {
        hasher.update(nf.as_bytes());
    }
    hasher.update(vk.as_bytes());
    let out: [u8; 32] = hasher.finalize().into();
    Digest::from(out)
}
