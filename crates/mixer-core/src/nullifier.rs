//! nullifier registry
//!
//! when a note is spent its nullifier is published. a nullifier that is
//! already in the set marks a double-spend attempt and the mix is rejected.

use std::collections::HashSet;

use crate::{Digest, Error, Result};

/// set of spent nullifiers; entries are never removed once a mix commits
#[derive(Clone, Debug, Default)]
pub struct NullifierSet {
    spent: HashSet<Digest>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// check if nullifier exists (note already spent)
    pub fn is_spent(&self, nullifier: &Digest) -> bool {
        self.spent.contains(nullifier)
    }

    /// mark a nullifier spent, failing if it already was
    pub fn mark_spent(&mut self, nullifier: Digest) -> Result<()> {
        if !self.spent.insert(nullifier) {
            return Err(Error::DoubleSpend(nullifier));
        }
        Ok(())
    }

    /// drop a nullifier staged by a mix that is being rolled back
    pub(crate) fn unstage(&mut self, nullifier: &Digest) {
        self.spent.remove(nullifier);
    }

    /// number of spent notes
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
