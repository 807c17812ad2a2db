//! curve-specific residual-bit layouts
//!
//! a 256-bit digest does not fit in one scalar of a ~254-bit field. the low
//! `capacity` bits travel in their own field element, the remaining top bits
//! are packed into the shared residual element:
//!
//! ```text
//! residual element (lsb first)
//! [0, 64)    public value out
//! [64, 128)  public value in
//! [128 + k*r, 128 + (k+1)*r)   top r bits of the digest in slot k
//! ```
//!
//! slot 0 is the session digest, slots 1..=JS_IN the nullifiers, and
//! slots JS_IN+1..=2*JS_IN the auth tags.

use crate::{digest_to_field, field_to_digest, Digest, FieldElement, JS_IN, PUBLIC_VALUE_BITS};

/// first residual bit after the two packed public values
pub const RESIDUAL_OFFSET: u32 = 2 * PUBLIC_VALUE_BITS;

/// number of residual slots (session digest, nullifiers, auth tags)
pub const RESIDUAL_SLOTS: usize = 1 + 2 * JS_IN;

/// mask with the low `bits` bits set
pub(crate) fn low_mask(bits: u32) -> FieldElement {
    if bits >= 256 {
        return FieldElement::MAX;
    }
    (FieldElement::one() << bits) - FieldElement::one()
}

/// residual-bit strategy for one proof-system scalar field
pub trait FieldLayout {
    /// curve name, for logs and config
    fn name(&self) -> &'static str;

    /// number of digest bits that fit in one field element
    fn capacity(&self) -> u32;

    /// number of digest bits carried in a residual slot
    fn residual_bits(&self) -> u32 {
        256 - self.capacity()
    }

    /// bit offset of residual slot `slot` inside the residual element
    fn slot_offset(&self, slot: usize) -> u32 {
        RESIDUAL_OFFSET + slot as u32 * self.residual_bits()
    }

    /// total number of meaningful bits in the residual element
    fn residual_width(&self) -> u32 {
        self.slot_offset(RESIDUAL_SLOTS)
    }

    /// field element carrying the low `capacity` bits of `digest`
    fn low_bits(&self, digest: &Digest) -> FieldElement {
        digest_to_field(digest) & low_mask(self.capacity())
    }

    /// residual contribution of `digest` placed at `slot`
    fn pack_residual(&self, digest: &Digest, slot: usize) -> FieldElement {
        let top = digest_to_field(digest) >> self.capacity();
        top << self.slot_offset(slot)
    }

    /// rebuild a full digest from its low field element and residual slot
    fn reassemble_digest(&self, low: &FieldElement, residual: &FieldElement, slot: usize) -> Digest {
        let r = self.residual_bits();
        let top = (*residual >> self.slot_offset(slot)) & low_mask(r);
        let low = *low & low_mask(self.capacity());
        field_to_digest(&((top << self.capacity()) | low))
    }
}

/// alt_bn128 scalar field (253-bit capacity, 3 residual bits)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bn254;

impl FieldLayout for Bn254 {
    fn name(&self) -> &'static str {
        "bn254"
    }

    fn capacity(&self) -> u32 {
        253
    }
}

/// bls12-377 scalar field (252-bit capacity, 4 residual bits)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub struct Bls12_377;

impl FieldLayout for Bls12_377 {
    fn name(&self) -> &'static str {
        "bls12-377"
    }

    fn capacity(&self) -> u32 {
        252
    }
}
