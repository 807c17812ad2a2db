//! property tests for the accumulator, nullifier registry and codec

use std::collections::HashSet;

use mixer_core::field::RESIDUAL_SLOTS;
use mixer_core::inputs::decode_public_values;
use mixer_core::{
    Bls12_377, Blake3Hasher, Bn254, Digest, Error, FieldLayout, MerkleTree, NullifierSet,
    PublicInputs,
};
use proptest::prelude::*;

fn digest_strategy() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from)
}

fn public_inputs_strategy() -> impl Strategy<Value = PublicInputs> {
    (
        any::<[u8; 31]>(),
        prop::array::uniform2(any::<[u8; 31]>()),
        prop::array::uniform2(digest_strategy()),
        digest_strategy(),
        prop::array::uniform2(digest_strategy()),
        any::<u64>(),
        any::<u64>(),
    )
        .prop_map(|(root, cms, nullifiers, session_digest, auth_tags, value_in, value_out)| {
            // root and commitments are field elements, keep them below 2^248
            let short = |b: [u8; 31]| {
                let mut bytes = [0u8; 32];
                bytes[1..].copy_from_slice(&b);
                Digest::from(bytes)
            };
            PublicInputs {
                root: short(root),
                commitments: cms.map(short),
                nullifiers,
                session_digest,
                auth_tags,
                value_in,
                value_out,
            }
        })
}

proptest! {
    #[test]
    fn test_root_monotonicity(leaves in prop::collection::vec(digest_strategy(), 1..24)) {
        let mut tree = MerkleTree::<Blake3Hasher>::new(5).unwrap();
        let mut seen = vec![tree.root()];

        for leaf in leaves {
            let root = tree.insert(leaf).unwrap();
            seen.push(root);
            prop_assert_eq!(tree.root(), root);
            for old in &seen {
                prop_assert!(tree.is_known_root(old));
            }
        }
    }

    #[test]
    fn test_no_double_spend(nullifiers in prop::collection::vec(digest_strategy(), 1..32)) {
        let mut set = NullifierSet::new();
        let mut marked = HashSet::new();

        for nf in nullifiers {
            let result = set.mark_spent(nf);
            if marked.insert(nf) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(matches!(result, Err(Error::DoubleSpend(d)) if d == nf));
            }
            prop_assert!(set.is_spent(&nf));
        }
        prop_assert_eq!(set.len(), marked.len());
    }

    #[test]
    fn test_residual_round_trip(digest in digest_strategy(), slot in 0..RESIDUAL_SLOTS) {
        let layouts: [&dyn FieldLayout; 2] = [&Bn254, &Bls12_377];
        for layout in layouts {
            let low = layout.low_bits(&digest);
            let residual = layout.pack_residual(&digest, slot);
            prop_assert_eq!(layout.reassemble_digest(&low, &residual, slot), digest);
        }
    }

    #[test]
    fn test_primary_inputs_round_trip(public in public_inputs_strategy()) {
        let layouts: [&dyn FieldLayout; 2] = [&Bn254, &Bls12_377];
        for layout in layouts {
            let inputs = public.encode(layout);
            prop_assert!(inputs.check_ranges(layout).is_ok());
            prop_assert_eq!(inputs.decode(layout), public.clone());
        }
    }

    #[test]
    fn test_public_values_scale(public in public_inputs_strategy(), unit in 1..1_000_000u64) {
        let inputs = public.encode(&Bn254);
        let (value_in, value_out) = decode_public_values(&inputs.residual(), unit);
        prop_assert_eq!(value_in, public.value_in as u128 * unit as u128);
        prop_assert_eq!(value_out, public.value_out as u128 * unit as u128);
    }
}
