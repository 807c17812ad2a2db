//! mixer pool
//!
//! one `process_mix` call is all-or-nothing:
//!
//! 1. shape checks (input length, scalar ranges, ciphertext count)
//! 2. root must be known
//! 3. nullifiers must be unspent and distinct
//! 4. session digest must equal blake2s(nullifiers || vk)
//! 5. proof must verify
//! 6. nullifiers marked spent, commitments appended (journaled)
//! 7. public values decoded
//! 8. value settled through the ledger
//! 9. mix record emitted
//!
//! checks 1-5 never touch state. a failure in 6-8 replays the journal so
//! the tree and nullifier set end up exactly as before the call.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::PoolConfig;
use crate::field::FieldLayout;
use crate::inputs::{decode_public_values, PrimaryInputs};
use crate::ledger::Ledger;
use crate::merkle::{Blake3Hasher, MerkleTree, TreeHasher, TreeJournal};
use crate::nullifier::NullifierSet;
use crate::session::session_digest;
use crate::verifier::{Proof, ProofVerifier};
use crate::{Address, Digest, Error, FieldElement, Result, JS_IN, JS_OUT, NUM_INPUTS};

/// one mix submission
#[derive(Clone, Debug)]
pub struct MixRequest {
    /// account that submits, pays value in and receives value out
    pub caller: Address,
    pub proof: Proof,
    pub inputs: Vec<FieldElement>,
    /// encrypted output notes, one per commitment
    pub ciphertexts: Vec<Vec<u8>>,
    /// native value attached to the call
    pub value: u128,
}

/// event emitted for every accepted mix
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixRecord {
    pub root: Digest,
    pub nullifiers: [Digest; JS_IN],
    pub commitments: [Digest; JS_OUT],
    pub ciphertexts: [Vec<u8>; JS_OUT],
}

/// protocol shape, for callers checking compatibility before proving
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub js_in: usize,
    pub js_out: usize,
    pub num_inputs: usize,
}

#[derive(Default)]
struct Journal {
    nullifiers: Vec<Digest>,
    tree: TreeJournal,
}

pub struct MixerPool<V, H = Blake3Hasher> {
    config: PoolConfig,
    layout: Box<dyn FieldLayout + Send + Sync>,
    verifier: V,
    tree: MerkleTree<H>,
    nullifiers: NullifierSet,
    records: Vec<MixRecord>,
}

impl<V: ProofVerifier, H: TreeHasher + Default> MixerPool<V, H> {
    pub fn new(config: PoolConfig, verifier: V) -> Result<Self> {
        Self::with_hasher(config, verifier, H::default())
    }
}

impl<V: ProofVerifier, H: TreeHasher> MixerPool<V, H> {
    pub fn with_hasher(config: PoolConfig, verifier: V, hasher: H) -> Result<Self> {
        config.validate()?;

        let layout = config.curve.layout();
        let tree = MerkleTree::with_hasher(config.tree_depth, hasher)?;
        info!(
            curve = layout.name(),
            depth = config.tree_depth,
            native = config.is_native(),
            genesis = ?tree.root(),
            "mixer pool initialized"
        );

        Ok(Self {
            config,
            layout,
            verifier,
            tree,
            nullifiers: NullifierSet::new(),
            records: Vec::new(),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            js_in: self.config.js_in,
            js_out: self.config.js_out,
            num_inputs: NUM_INPUTS,
        }
    }

    pub fn layout(&self) -> &dyn FieldLayout {
        self.layout.as_ref()
    }

    pub fn tree(&self) -> &MerkleTree<H> {
        &self.tree
    }

    pub fn nullifiers(&self) -> &NullifierSet {
        &self.nullifiers
    }

    pub fn root(&self) -> Digest {
        self.tree.root()
    }

    pub fn is_known_root(&self, root: &Digest) -> bool {
        self.tree.is_known_root(root)
    }

    pub fn is_spent(&self, nullifier: &Digest) -> bool {
        self.nullifiers.is_spent(nullifier)
    }

    pub fn leaf_count(&self) -> u64 {
        self.tree.len()
    }

    /// every mix record emitted so far, oldest first
    pub fn records(&self) -> &[MixRecord] {
        &self.records
    }

    /// validate, apply and settle one mix
    pub fn process_mix<L: Ledger>(&mut self, request: MixRequest, ledger: &mut L) -> Result<MixRecord> {
        let MixRequest {
            caller,
            proof,
            inputs,
            ciphertexts,
            value,
        } = request;

        let inputs = PrimaryInputs::new(&inputs)?;
        inputs.check_ranges(self.layout())?;
        let ciphertexts: [Vec<u8>; JS_OUT] = ciphertexts.try_into().map_err(|c: Vec<Vec<u8>>| {
            Error::MalformedInput(format!("expected {} ciphertexts, got {}", JS_OUT, c.len()))
        })?;

        let root = inputs.root();
        if !self.tree.is_known_root(&root) {
            warn!(?root, "mix rejected: unknown root");
            return Err(Error::UnknownRoot(root));
        }

        let nullifiers = self.collect_nullifiers(&inputs)?;

        let expected = session_digest(&nullifiers, &self.config.verification_key);
        let actual = inputs.assemble_session_digest(self.layout());
        if expected != actual {
            warn!(?expected, ?actual, "mix rejected: session digest mismatch");
            return Err(Error::SessionDigestMismatch { expected, actual });
        }

        if !self
            .verifier
            .verify(&self.config.verification_key, &proof, inputs.as_slice())
        {
            warn!(?root, "mix rejected: invalid proof");
            return Err(Error::InvalidProof);
        }

        let mut journal = Journal::default();
        if let Err(e) = self.commit_and_settle(&caller, value, &inputs, &nullifiers, ledger, &mut journal) {
            warn!(error = %e, "mix failed after verification, reverting");
            self.revert(journal);
            return Err(e);
        }

        let record = MixRecord {
            root,
            nullifiers,
            commitments: inputs.commitments(),
            ciphertexts,
        };
        info!(
            ?root,
            new_root = ?self.tree.root(),
            leaves = self.tree.len(),
            "mix accepted"
        );
        self.records.push(record.clone());
        Ok(record)
    }

    fn collect_nullifiers(&self, inputs: &PrimaryInputs) -> Result<[Digest; JS_IN]> {
        let mut nullifiers = [Digest::zero(); JS_IN];
        for i in 0..JS_IN {
            let nf = inputs.assemble_nullifier(i, self.layout())?;
            if self.nullifiers.is_spent(&nf) || nullifiers[..i].contains(&nf) {
                warn!(nullifier = ?nf, "mix rejected: double spend");
                return Err(Error::DoubleSpend(nf));
            }
            nullifiers[i] = nf;
        }
        Ok(nullifiers)
    }

    fn commit_and_settle<L: Ledger>(
        &mut self,
        caller: &Address,
        offered: u128,
        inputs: &PrimaryInputs,
        nullifiers: &[Digest; JS_IN],
        ledger: &mut L,
        journal: &mut Journal,
    ) -> Result<()> {
        for nf in nullifiers {
            self.nullifiers.mark_spent(*nf)?;
            journal.nullifiers.push(*nf);
        }
        for cm in inputs.commitments() {
            self.tree.insert_journaled(cm, &mut journal.tree)?;
        }

        let (value_in, value_out) = decode_public_values(&inputs.residual(), self.config.value_unit);
        debug!(value_in, value_out, offered, "decoded public values");

        self.settle(caller, offered, value_in, value_out, ledger)
    }

    /// moves value for one mix. at most one pull and one push touch the
    /// caller: the refund of attached value and the payout share a single
    /// push, and a failed push after a token pull returns the deposit
    fn settle<L: Ledger>(
        &self,
        caller: &Address,
        offered: u128,
        value_in: u128,
        value_out: u128,
        ledger: &mut L,
    ) -> Result<()> {
        let mut pulled = 0;
        let refund = if value_in == 0 {
            offered
        } else {
            match self.config.token {
                // attached value is already in pool custody
                None if offered != value_in => {
                    return Err(Error::IncorrectValueSubmitted {
                        expected: value_in,
                        offered,
                    });
                }
                None => 0,
                Some(_) if offered > 0 => {
                    return Err(Error::IncorrectValueSubmitted { expected: 0, offered });
                }
                Some(token) => {
                    ledger
                        .pull(caller, value_in)
                        .map_err(|source| Error::DepositFailed { amount: value_in, source })?;
                    info!(?token, amount = value_in, "pulled token deposit");
                    pulled = value_in;
                    0
                }
            }
        };

        let total = refund.saturating_add(value_out);
        if total == 0 {
            return Ok(());
        }
        if let Err(source) = ledger.push(caller, total) {
            if pulled > 0 {
                if let Err(e) = ledger.push(caller, pulled) {
                    error!(error = %e, amount = pulled, "could not return token deposit");
                }
            }
            return Err(if value_out > 0 {
                Error::PayoutFailed { amount: value_out, source }
            } else {
                Error::RefundFailed { amount: refund, source }
            });
        }
        info!(refund, payout = value_out, "pushed value to caller");
        Ok(())
    }

    fn revert(&mut self, journal: Journal) {
        for nf in &journal.nullifiers {
            self.nullifiers.unstage(nf);
        }
        self.tree.rollback(journal.tree);
    }
}
