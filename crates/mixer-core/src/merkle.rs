//! commitment accumulator
//!
//! fixed-depth append-only merkle tree of note commitments. nodes are stored
//! sparsely in heap order (index 0 is the root, children of `i` are `2i+1`
//! and `2i+2`); absent nodes are roots of empty subtrees.
//!
//! every root the tree ever had stays valid, so a proof built against an
//! older root survives unrelated deposits landing first.

use std::collections::{HashMap, HashSet};

use sha2::{Digest as _, Sha256};
use tracing::debug;

use crate::config::MAX_TREE_DEPTH;
use crate::{Digest, Error, Result, MERKLE_DOMAIN};

/// two-to-one compression used for interior nodes
pub trait TreeHasher {
    fn compress(&self, left: &Digest, right: &Digest) -> Digest;
}

/// domain-separated blake3 compression
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl TreeHasher for Blake3Hasher {
    fn compress(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(MERKLE_DOMAIN);
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        Digest::from(*hasher.finalize().as_bytes())
    }
}

/// sha256(left || right)
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl TreeHasher for Sha256Hasher {
    fn compress(&self, left: &Digest, right: &Digest) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        let out: [u8; 32] = hasher.finalize().into();
        Digest::from(out)
    }
}

/// merkle inclusion path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    /// leaf position
    pub index: u64,
    /// sibling digests from leaf to root
    pub siblings: Vec<Digest>,
}

impl MerklePath {
    /// verify that `leaf` sits at `index` in a tree with `root`
    pub fn verify<H: TreeHasher>(&self, leaf: &Digest, root: &Digest, hasher: &H) -> bool {
        let mut current = *leaf;
        let mut pos = self.index;

        for sibling in &self.siblings {
            current = if pos & 1 == 0 {
                hasher.compress(&current, sibling)
            } else {
                hasher.compress(sibling, &current)
            };
            pos >>= 1;
        }

        current == *root
    }
}

/// undo log for inserts staged inside one mix
#[derive(Debug, Default)]
pub(crate) struct TreeJournal {
    next_leaf: Option<u64>,
    nodes: Vec<(u64, Option<Digest>)>,
    roots: Vec<Digest>,
}

pub struct MerkleTree<H = Blake3Hasher> {
    depth: u32,
    hasher: H,
    /// heap index -> digest, absent means empty subtree
    nodes: HashMap<u64, Digest>,
    /// empty[h] = root of an empty subtree of height h
    empty: Vec<Digest>,
    next_leaf: u64,
    /// every root ever held, genesis included
    roots: HashSet<Digest>,
}

impl<H: TreeHasher + Default> MerkleTree<H> {
    pub fn new(depth: u32) -> Result<Self> {
        Self::with_hasher(depth, H::default())
    }
}

impl<H: TreeHasher> MerkleTree<H> {
    /// empty tree of given depth, `1..=MAX_TREE_DEPTH`
    pub fn with_hasher(depth: u32, hasher: H) -> Result<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(Error::Config(format!(
                "tree depth must be in 1..={MAX_TREE_DEPTH}, got {depth}"
            )));
        }

        let mut empty = Vec::with_capacity(depth as usize + 1);
        empty.push(Digest::zero());
        for h in 0..depth as usize {
            let below = empty[h];
            empty.push(hasher.compress(&below, &below));
        }

        let genesis = empty[depth as usize];
        let mut roots = HashSet::new();
        roots.insert(genesis);

        Ok(Self {
            depth,
            hasher,
            nodes: HashMap::new(),
            empty,
            next_leaf: 0,
            roots,
        })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// maximum number of leaves
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// number of appended leaves
    pub fn len(&self) -> u64 {
        self.next_leaf
    }

    pub fn is_empty(&self) -> bool {
        self.next_leaf == 0
    }

    pub fn is_full(&self) -> bool {
        self.next_leaf >= self.capacity()
    }

    /// root of the empty tree
    pub fn genesis_root(&self) -> Digest {
        self.empty[self.depth as usize]
    }

    /// current root
    pub fn root(&self) -> Digest {
        self.node_at(0, self.depth)
    }

    /// true if `root` is the current root or was a root at any point
    pub fn is_known_root(&self, root: &Digest) -> bool {
        self.roots.contains(root)
    }

    /// number of distinct roots ever held
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// leaf at `index`, if appended
    pub fn leaf(&self, index: u64) -> Option<Digest> {
        if index >= self.next_leaf {
            return None;
        }
        Some(self.node_at(self.first_leaf_index() + index, 0))
    }

    /// append a leaf, returning the new root
    pub fn insert(&mut self, leaf: Digest) -> Result<Digest> {
        self.insert_inner(leaf, None)
    }

    /// append a leaf, recording what to undo on rollback
    pub(crate) fn insert_journaled(&mut self, leaf: Digest, journal: &mut TreeJournal) -> Result<Digest> {
        self.insert_inner(leaf, Some(journal))
    }

    /// undo every insert recorded in `journal`
    pub(crate) fn rollback(&mut self, journal: TreeJournal) {
        for (index, previous) in journal.nodes.into_iter().rev() {
            match previous {
                Some(digest) => self.nodes.insert(index, digest),
                None => self.nodes.remove(&index),
            };
        }
        for root in journal.roots {
            self.roots.remove(&root);
        }
        if let Some(next_leaf) = journal.next_leaf {
            self.next_leaf = next_leaf;
        }
    }

    /// inclusion path for an appended leaf
    pub fn path(&self, leaf_index: u64) -> Option<MerklePath> {
        if leaf_index >= self.next_leaf {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut index = self.first_leaf_index() + leaf_index;
        for height in 0..self.depth {
            siblings.push(self.node_at(sibling_of(index), height));
            index = parent_of(index);
        }

        Some(MerklePath {
            index: leaf_index,
            siblings,
        })
    }

    fn insert_inner(&mut self, leaf: Digest, mut journal: Option<&mut TreeJournal>) -> Result<Digest> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                depth: self.depth,
                capacity: self.capacity(),
            });
        }

        if let Some(journal) = journal.as_deref_mut() {
            journal.next_leaf.get_or_insert(self.next_leaf);
        }

        let leaf_index = self.next_leaf;
        let mut index = self.first_leaf_index() + leaf_index;
        let mut current = leaf;
        self.set_node(index, current, journal.as_deref_mut());

        for height in 0..self.depth {
            let sibling = self.node_at(sibling_of(index), height);
            current = if is_left_child(index) {
                self.hasher.compress(&current, &sibling)
            } else {
                self.hasher.compress(&sibling, &current)
            };
            index = parent_of(index);
            self.set_node(index, current, journal.as_deref_mut());
        }

        self.next_leaf += 1;
        if self.roots.insert(current) {
            if let Some(journal) = journal {
                journal.roots.push(current);
            }
        }

        debug!(leaf_index, root = ?current, "appended leaf");
        Ok(current)
    }

    fn set_node(&mut self, index: u64, digest: Digest, journal: Option<&mut TreeJournal>) {
        let previous = self.nodes.insert(index, digest);
        if let Some(journal) = journal {
            journal.nodes.push((index, previous));
        }
    }

    fn node_at(&self, index: u64, height: u32) -> Digest {
        self.nodes
            .get(&index)
            .copied()
            .unwrap_or(self.empty[height as usize])
    }

    fn first_leaf_index(&self) -> u64 {
        (1u64 << self.depth) - 1
    }
}

fn is_left_child(index: u64) -> bool {
    index % 2 == 1
}

fn sibling_of(index: u64) -> u64 {
    if is_left_child(index) {
        index + 1
    } else {
        index - 1
    }
}

fn parent_of(index: u64) -> u64 {
    (index - 1) / 2
}
