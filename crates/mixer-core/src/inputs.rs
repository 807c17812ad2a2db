//! primary-input codec
//!
//! the proof's public inputs are a fixed vector of `NUM_INPUTS` scalars:
//!
//! ```text
//! [root, cm_0..cm_{JS_OUT-1}, nf_0..nf_{JS_IN-1}, h_sig, h_0..h_{JS_IN-1}, residual]
//! ```
//!
//! root and commitments are plain field elements. nullifiers, the session
//! digest (h_sig) and the auth tags are 256-bit digests split between their
//! own element (low bits) and a slot of the residual element (high bits),
//! see [`crate::field`]. the residual element also packs value_out in bits
//! [0, 64) and value_in in bits [64, 128).
//!
//! the layout is shared with externally generated proofs and must not change.

use crate::field::{low_mask, FieldLayout};
use crate::{
    digest_to_field, field_to_digest, Digest, Error, FieldElement, Result, JS_IN, JS_OUT,
    NUM_INPUTS, PUBLIC_VALUE_BITS,
};

pub const ROOT_INDEX: usize = 0;
pub const COMMITMENTS_INDEX: usize = 1;
pub const NULLIFIERS_INDEX: usize = COMMITMENTS_INDEX + JS_OUT;
pub const SESSION_DIGEST_INDEX: usize = NULLIFIERS_INDEX + JS_IN;
pub const AUTH_TAGS_INDEX: usize = SESSION_DIGEST_INDEX + 1;
pub const RESIDUAL_INDEX: usize = AUTH_TAGS_INDEX + JS_IN;

/// residual slot of the session digest
pub const SESSION_DIGEST_SLOT: usize = 0;
/// residual slot of nullifier 0
pub const NULLIFIERS_SLOT: usize = 1;
/// residual slot of auth tag 0
pub const AUTH_TAGS_SLOT: usize = NULLIFIERS_SLOT + JS_IN;

const _: () = assert!(RESIDUAL_INDEX + 1 == NUM_INPUTS);

/// split the residual element into (value_in, value_out) external amounts
pub fn decode_public_values(residual: &FieldElement, value_unit: u64) -> (u128, u128) {
    let (value_in, value_out) = unpack_public_values(residual);
    (
        value_in as u128 * value_unit as u128,
        value_out as u128 * value_unit as u128,
    )
}

/// raw packed (value_in, value_out), before scaling by the value unit
pub fn unpack_public_values(residual: &FieldElement) -> (u64, u64) {
    let mask = low_mask(PUBLIC_VALUE_BITS);
    let value_out = (*residual & mask).low_u64();
    let value_in = ((*residual >> PUBLIC_VALUE_BITS) & mask).low_u64();
    (value_in, value_out)
}

/// public-input vector of one mix, length checked
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryInputs([FieldElement; NUM_INPUTS]);

impl PrimaryInputs {
    /// wrap a raw vector, rejecting any length other than `NUM_INPUTS`
    pub fn new(elements: &[FieldElement]) -> Result<Self> {
        let array: [FieldElement; NUM_INPUTS] = elements.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "expected {} primary inputs, got {}",
                NUM_INPUTS,
                elements.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// reject digest elements wider than the field capacity and residual
    /// bits above the last slot; either would let two encodings map to the
    /// same digest
    pub fn check_ranges(&self, layout: &dyn FieldLayout) -> Result<()> {
        let capacity = layout.capacity() as usize;
        let split = NULLIFIERS_INDEX..RESIDUAL_INDEX;
        for index in split {
            let bits = self.0[index].bits();
            if bits > capacity {
                return Err(Error::MalformedInput(format!(
                    "input {index} has {bits} bits, {} field holds {capacity}",
                    layout.name()
                )));
            }
        }

        let bits = self.residual().bits();
        let width = layout.residual_width() as usize;
        if bits > width {
            return Err(Error::MalformedInput(format!(
                "residual element has {bits} bits, layout uses {width}"
            )));
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[FieldElement] {
        &self.0
    }

    pub fn root(&self) -> Digest {
        field_to_digest(&self.0[ROOT_INDEX])
    }

    pub fn commitment(&self, index: usize) -> Result<Digest> {
        check_index(index, JS_OUT)?;
        Ok(field_to_digest(&self.0[COMMITMENTS_INDEX + index]))
    }

    pub fn commitments(&self) -> [Digest; JS_OUT] {
        std::array::from_fn(|i| field_to_digest(&self.0[COMMITMENTS_INDEX + i]))
    }

    pub fn residual(&self) -> FieldElement {
        self.0[RESIDUAL_INDEX]
    }

    pub fn assemble_session_digest(&self, layout: &dyn FieldLayout) -> Digest {
        layout.reassemble_digest(
            &self.0[SESSION_DIGEST_INDEX],
            &self.residual(),
            SESSION_DIGEST_SLOT,
        )
    }

    pub fn assemble_nullifier(&self, index: usize, layout: &dyn FieldLayout) -> Result<Digest> {
        check_index(index, JS_IN)?;
        Ok(layout.reassemble_digest(
            &self.0[NULLIFIERS_INDEX + index],
            &self.residual(),
            NULLIFIERS_SLOT + index,
        ))
    }

    pub fn assemble_auth_tag(&self, index: usize, layout: &dyn FieldLayout) -> Result<Digest> {
        check_index(index, JS_IN)?;
        Ok(layout.reassemble_digest(
            &self.0[AUTH_TAGS_INDEX + index],
            &self.residual(),
            AUTH_TAGS_SLOT + index,
        ))
    }

    /// full structured view
    pub fn decode(&self, layout: &dyn FieldLayout) -> PublicInputs {
        let residual = self.residual();
        let (value_in, value_out) = unpack_public_values(&residual);
        let split = |index: usize, slot: usize| layout.reassemble_digest(&self.0[index], &residual, slot);

        PublicInputs {
            root: self.root(),
            commitments: self.commitments(),
            nullifiers: std::array::from_fn(|i| split(NULLIFIERS_INDEX + i, NULLIFIERS_SLOT + i)),
            session_digest: split(SESSION_DIGEST_INDEX, SESSION_DIGEST_SLOT),
            auth_tags: std::array::from_fn(|i| split(AUTH_TAGS_INDEX + i, AUTH_TAGS_SLOT + i)),
            value_in,
            value_out,
        }
    }
}

fn check_index(index: usize, bound: usize) -> Result<()> {
    if index >= bound {
        return Err(Error::IndexOutOfRange { index, bound });
    }
    Ok(())
}

/// structured public inputs of one mix
///
/// `value_in` / `value_out` are raw packed values, not scaled by the
/// pool's value unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublicInputs {
    pub root: Digest,
    pub commitments: [Digest; JS_OUT],
    pub nullifiers: [Digest; JS_IN],
    pub session_digest: Digest,
    pub auth_tags: [Digest; JS_IN],
    pub value_in: u64,
    pub value_out: u64,
}

impl PublicInputs {
    /// pack into the primary-input vector for `layout`
    ///
    /// root and commitments are taken as field elements verbatim and must
    /// already be below the field modulus.
    pub fn encode(&self, layout: &dyn FieldLayout) -> PrimaryInputs {
        let mut elements = [FieldElement::zero(); NUM_INPUTS];
        let mut residual = FieldElement::from(self.value_out)
            | (FieldElement::from(self.value_in) << PUBLIC_VALUE_BITS);

        elements[ROOT_INDEX] = digest_to_field(&self.root);
        for (i, cm) in self.commitments.iter().enumerate() {
            elements[COMMITMENTS_INDEX + i] = digest_to_field(cm);
        }

        let mut split = |index: usize, slot: usize, digest: &Digest| {
            elements[index] = layout.low_bits(digest);
            residual = residual | layout.pack_residual(digest, slot);
        };
        split(SESSION_DIGEST_INDEX, SESSION_DIGEST_SLOT, &self.session_digest);
        for (i, nf) in self.nullifiers.iter().enumerate() {
            split(NULLIFIERS_INDEX + i, NULLIFIERS_SLOT + i, nf);
        }
        for (i, tag) in self.auth_tags.iter().enumerate() {
            split(AUTH_TAGS_INDEX + i, AUTH_TAGS_SLOT + i, tag);
        }

        elements[RESIDUAL_INDEX] = residual;
        PrimaryInputs(elements)
    }

    /// 32 bytes per field, in the order root, nullifiers, commitments,
    /// value_in, value_out, session digest, auth tags
    pub fn hash_encoding(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 * (NUM_INPUTS + 1));
        out.extend_from_slice(self.root.as_bytes());
        for nf in &self.nullifiers {
            out.extend_from_slice(nf.as_bytes());
        }
        for cm in &self.commitments {
            out.extend_from_slice(cm.as_bytes());
        }
        for value in [self.value_in, self.value_out] {
            out.extend_from_slice(&[0u8; 24]);
            out.extend_from_slice(&value.to_be_bytes());
        }
        out.extend_from_slice(self.session_digest.as_bytes());
        for tag in &self.auth_tags {
            out.extend_from_slice(tag.as_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Bls12_377, Bn254};

    fn test_digest(seed: u8) -> Digest {
        Digest::repeat_byte(seed)
    }

    fn sample() -> PublicInputs {
        PublicInputs {
            root: Digest::from_low_u64_be(42),
            commitments: [Digest::from_low_u64_be(7), Digest::from_low_u64_be(8)],
            nullifiers: [test_digest(0xf1), test_digest(0x2e)],
            session_digest: test_digest(0xab),
            auth_tags: [test_digest(0xc3), test_digest(0x9d)],
            value_in: 100,
            value_out: u64::MAX,
        }
    }

    #[test]
    fn test_layout_indices() {
        assert_eq!(NULLIFIERS_INDEX, 3);
        assert_eq!(SESSION_DIGEST_INDEX, 5);
        assert_eq!(AUTH_TAGS_INDEX, 6);
        assert_eq!(RESIDUAL_INDEX, 8);
        assert_eq!(AUTH_TAGS_SLOT, 3);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = PrimaryInputs::new(&[FieldElement::zero(); NUM_INPUTS - 1]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(PrimaryInputs::new(&[FieldElement::zero(); NUM_INPUTS + 1]).is_err());
        assert!(PrimaryInputs::new(&[]).is_err());
    }

    #[test]
    fn test_decode_matches_encode() {
        let public = sample();
        for layout in [&Bn254 as &dyn FieldLayout, &Bls12_377 as &dyn FieldLayout] {
            let inputs = public.encode(layout);
            inputs.check_ranges(layout).unwrap();

            assert_eq!(inputs.root(), public.root);
            assert_eq!(inputs.commitments(), public.commitments);
            assert_eq!(inputs.assemble_session_digest(layout), public.session_digest);
            assert_eq!(inputs.assemble_nullifier(0, layout).unwrap(), public.nullifiers[0]);
            assert_eq!(inputs.assemble_nullifier(1, layout).unwrap(), public.nullifiers[1]);
            assert_eq!(inputs.assemble_auth_tag(1, layout).unwrap(), public.auth_tags[1]);
            assert_eq!(inputs.decode(layout), public);
        }
    }

    #[test]
    fn test_decode_public_values() {
        let residual = FieldElement::from(5u64) | (FieldElement::from(100u64) << 64);
        assert_eq!(unpack_public_values(&residual), (100, 5));
        assert_eq!(decode_public_values(&residual, 1_000), (100_000, 5_000));

        // residual slots above bit 128 don't leak into the values
        let noisy = residual | (FieldElement::from(7u64) << 128);
        assert_eq!(unpack_public_values(&noisy), (100, 5));

        let max = low_mask(128);
        assert_eq!(
            decode_public_values(&max, u64::MAX),
            (u64::MAX as u128 * u64::MAX as u128, u64::MAX as u128 * u64::MAX as u128)
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let inputs = sample().encode(&Bn254);
        assert!(matches!(
            inputs.assemble_nullifier(JS_IN, &Bn254),
            Err(Error::IndexOutOfRange { index: 2, bound: 2 })
        ));
        assert!(inputs.assemble_auth_tag(5, &Bn254).is_err());
        assert!(inputs.commitment(JS_OUT).is_err());
        assert_eq!(inputs.commitment(1).unwrap(), sample().commitments[1]);
    }

    #[test]
    fn test_check_ranges_rejects_wide_elements() {
        let inputs = sample().encode(&Bn254);

        // nullifier element with a bit above the bn254 capacity
        let mut raw = inputs.as_slice().to_vec();
        raw[NULLIFIERS_INDEX] = raw[NULLIFIERS_INDEX] | (FieldElement::one() << 253);
        let wide = PrimaryInputs::new(&raw).unwrap();
        assert!(matches!(wide.check_ranges(&Bn254), Err(Error::MalformedInput(_))));

        // residual bit past the last slot
        let mut raw = inputs.as_slice().to_vec();
        raw[RESIDUAL_INDEX] = raw[RESIDUAL_INDEX] | (FieldElement::one() << Bn254.residual_width());
        let wide = PrimaryInputs::new(&raw).unwrap();
        assert!(matches!(wide.check_ranges(&Bn254), Err(Error::MalformedInput(_))));

        // bn254 low elements carry 253 bits, one more than bls12-377 holds
        let full = PublicInputs {
            nullifiers: [test_digest(0xff), test_digest(0xff)],
            ..sample()
        };
        let inputs = full.encode(&Bn254);
        assert!(inputs.check_ranges(&Bls12_377).is_err());
    }

    #[test]
    fn test_hash_encoding_layout() {
        let public = sample();
        let bytes = public.hash_encoding();
        assert_eq!(bytes.len(), 32 * 10);
        assert_eq!(&bytes[..32], public.root.as_bytes());
        assert_eq!(&bytes[32..64], public.nullifiers[0].as_bytes());
        assert_eq!(&bytes[96..128], public.commitments[0].as_bytes());
        // value_in, big-endian in a 32-byte word
        assert_eq!(&bytes[160..192][24..], &100u64.to_be_bytes());
        assert_eq!(&bytes[224..256], public.session_digest.as_bytes());
        assert_eq!(&bytes[288..], public.auth_tags[1].as_bytes());
    }
}
