use std::collections::{BTreeMap, BTreeSet};

use aggregator_types::{HashPath, Hash32, Leaf};
use keccak_hash::keccak;

use crate::error::StoreError;

/// A single fixed-depth, sparse Merkle tree with staged-overlay commit
/// semantics. Unwritten leaves read as all-zero; the hash of an empty
/// subtree at any level is precomputed once and reused, so sparsely
/// populated trees stay cheap to query regardless of depth.
pub struct Tree {
    depth: u8,
    zero_hashes: Vec<Hash32>,
    leaves: BTreeMap<u128, Leaf>,
    touched: BTreeSet<u128>,
    overlay: BTreeMap<u128, Leaf>,
    overlay_touched: BTreeSet<u128>,
}

impl Tree {
    pub fn new(depth: u8) -> Self {
        let mut zero_hashes = Vec::with_capacity(depth as usize + 1);
        zero_hashes.push(hash_leaf(&[0u8; 64]));
        for i in 0..depth {
            let prev = zero_hashes[i as usize];
            zero_hashes.push(hash_pair(&prev, &prev));
        }
        Self {
            depth,
            zero_hashes,
            leaves: BTreeMap::new(),
            touched: BTreeSet::new(),
            overlay: BTreeMap::new(),
            overlay_touched: BTreeSet::new(),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    fn max_index(&self) -> u128 {
        if self.depth >= 128 {
            u128::MAX
        } else {
            (1u128 << self.depth) - 1
        }
    }

    /// Number of leaves from index 0 up to the highest touched index,
    /// inclusive. Meaningful for positionally-indexed trees (the data
    /// tree); for hash-keyed trees (nullifier, root) this saturates at
    /// `u64::MAX` rather than wrapping, since no caller treats it as a
    /// real leaf count for those.
    pub fn size(&self) -> u64 {
        let highest = self
            .touched
            .iter()
            .chain(self.overlay_touched.iter())
            .max()
            .copied();
        match highest {
            Some(index) => u64::try_from(index).unwrap_or(u64::MAX).saturating_add(1),
            None => 0,
        }
    }

    pub fn get(&self, key: u128) -> Leaf {
        self.overlay
            .get(&key)
            .or_else(|| self.leaves.get(&key))
            .copied()
            .unwrap_or(aggregator_types::zero_leaf())
    }

    pub fn put(&mut self, key: u128, value: Leaf) -> Result<(), StoreError> {
        if key > self.max_index() {
            return Err(StoreError::KeyOutOfRange(key, self.max_index()));
        }
        self.overlay.insert(key, value);
        self.overlay_touched.insert(key);
        Ok(())
    }

    pub fn root(&self) -> Hash32 {
        self.node_hash(self.depth, 0)
    }

    pub fn hash_path(&self, key: u128) -> HashPath {
        let mut entries = Vec::with_capacity(self.depth as usize + 1);
        for level in 0..self.depth {
            let node_index = key >> level;
            let left_index = node_index & !1u128;
            let left = self.node_hash(level, left_index);
            let right = self.node_hash(level, left_index | 1);
            entries.push([left, right]);
        }
        let root = self.root();
        entries.push([root, [0u8; 32]]);
        HashPath(entries)
    }

    pub fn commit(&mut self) {
        for (k, v) in self.overlay.drain() {
            self.leaves.insert(k, v);
        }
        self.touched.append(&mut self.overlay_touched);
    }

    pub fn rollback(&mut self) {
        self.overlay.clear();
        self.overlay_touched.clear();
    }

    /// Hash of the node at `(level, index)`, falling back to the
    /// precomputed empty-subtree hash when no touched leaf falls under it.
    fn node_hash(&self, level: u8, index: u128) -> Hash32 {
        if level == 0 {
            return self
                .overlay
                .get(&index)
                .or_else(|| self.leaves.get(&index))
                .map(|leaf| hash_leaf(leaf))
                .unwrap_or(self.zero_hashes[0]);
        }
        // `index`'s subtree spans `[index * 2^level, (index + 1) * 2^level)`.
        // At the top levels that span can reach or exceed `u128::MAX`, which
        // doesn't fit a plain shift/add, so the bound is computed with
        // checked arithmetic and treated as open-ended on overflow.
        let low = 1u128
            .checked_shl(level as u32)
            .and_then(|span| index.checked_mul(span));
        let (has_committed, has_staged) = match low {
            None => (!self.touched.is_empty(), !self.overlay_touched.is_empty()),
            Some(low) => {
                let high = 1u128
                    .checked_shl(level as u32)
                    .and_then(|span| low.checked_add(span));
                match high {
                    Some(high) => (
                        self.touched.range(low..high).next().is_some(),
                        self.overlay_touched.range(low..high).next().is_some(),
                    ),
                    None => (
                        self.touched.range(low..).next().is_some(),
                        self.overlay_touched.range(low..).next().is_some(),
                    ),
                }
            }
        };
        if !has_committed && !has_staged {
            return self.zero_hashes[level as usize];
        }
        let left = self.node_hash(level - 1, index * 2);
        let right = self.node_hash(level - 1, index * 2 + 1);
        hash_pair(&left, &right)
    }
}

fn hash_leaf(leaf: &Leaf) -> Hash32 {
    keccak(&leaf[..]).0
}

fn hash_pair(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    keccak(&buf[..]).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_root_is_stable_zero_hash() {
        let tree = Tree::new(4);
        let root_a = tree.root();
        let tree_b = Tree::new(4);
        assert_eq!(root_a, tree_b.root());
    }

    #[test]
    fn put_then_rollback_restores_original_root() {
        let mut tree = Tree::new(4);
        let before = tree.root();
        tree.put(3, [7u8; 64]).unwrap();
        assert_ne!(tree.root(), before);
        tree.rollback();
        assert_eq!(tree.root(), before);
    }

    #[test]
    fn put_then_commit_is_visible_after_rollback_of_new_changes() {
        let mut tree = Tree::new(4);
        tree.put(0, [9u8; 64]).unwrap();
        tree.commit();
        let committed_root = tree.root();
        tree.put(1, [5u8; 64]).unwrap();
        tree.rollback();
        assert_eq!(tree.root(), committed_root);
        assert_eq!(tree.get(0), [9u8; 64]);
        assert_eq!(tree.get(1), aggregator_types::zero_leaf());
    }

    #[test]
    fn hash_path_has_depth_plus_one_entries() {
        let tree = Tree::new(5);
        let path = tree.hash_path(2);
        assert_eq!(path.0.len(), 6);
    }

    #[test]
    fn out_of_range_key_is_rejected() {
        let mut tree = Tree::new(2);
        assert!(tree.put(4, [0u8; 64]).is_err());
    }
}
