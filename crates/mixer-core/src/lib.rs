//! shielded mixer core
//!
//! state-transition and proof-binding logic of a 2-in/2-out shielded pool
//!
//! # architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        MIXER POOL                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  mix(proof, primary inputs, ciphertexts, offered value)      │
//! │  ├─ codec: unpack root / commitments / nullifiers /          │
//! │  │         session digest / auth tags / residual bits        │
//! │  ├─ merkle: root must be a known (current or past) root      │
//! │  ├─ nullifiers: every nullifier must be unspent              │
//! │  ├─ session digest = blake2s(nullifiers || vk)               │
//! │  ├─ verifier: external zk predicate                          │
//! │  ├─ commit: mark nullifiers, append commitments              │
//! │  └─ settle: deposit / refund / payout, revert on failure     │
//! │                                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod inputs;
pub mod ledger;
pub mod merkle;
pub mod nullifier;
pub mod pool;
pub mod session;
pub mod verifier;

pub use config::{Curve, PoolConfig};
pub use error::{Error, Result};
pub use field::{Bls12_377, Bn254, FieldLayout};
pub use inputs::{PrimaryInputs, PublicInputs};
pub use ledger::{InMemoryLedger, Ledger, TransferError};
pub use merkle::{Blake3Hasher, MerklePath, MerkleTree, Sha256Hasher, TreeHasher};
pub use nullifier::NullifierSet;
pub use pool::{Dimensions, MixRecord, MixRequest, MixerPool};
pub use verifier::{Proof, ProofVerifier, VerificationKey};

/// opaque 256-bit digest (tree nodes, roots, nullifiers, session digests)
pub type Digest = primitive_types::H256;

/// proof-system scalar, always below the field modulus
pub type FieldElement = primitive_types::U256;

/// account or token contract identifier
pub type Address = primitive_types::H160;

/// number of notes consumed per mix
pub const JS_IN: usize = 2;

/// number of notes produced per mix
pub const JS_OUT: usize = 2;

/// bit width of each packed public value
pub const PUBLIC_VALUE_BITS: u32 = 64;

/// length of the primary-input vector
pub const NUM_INPUTS: usize = 1 + JS_OUT + (1 + 2 * JS_IN) + 1;

/// default commitment tree depth (2^32 notes)
pub const DEFAULT_TREE_DEPTH: u32 = 32;

/// domain separator for commitment tree nodes
pub const MERKLE_DOMAIN: &[u8] = b"mixer-core.merkle.v1";

/// big-endian view of a digest as a scalar
pub fn digest_to_field(digest: &Digest) -> FieldElement {
    FieldElement::from_big_endian(digest.as_bytes())
}

/// big-endian view of a scalar as a digest
pub fn field_to_digest(element: &FieldElement) -> Digest {
    let mut bytes = [0u8; 32];
    element.to_big_endian(&mut bytes);
    Digest::from(bytes)
}
