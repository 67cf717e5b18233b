//! In-memory world state: the three Merkle trees (data, nullifier, root)
//! that admission and rollup construction read and the state queue is the
//! sole writer of.

pub mod error;
mod tree;

use aggregator_types::{Hash32, HashPath, Leaf, TreeId};
use tracing::debug;

pub use error::StoreError;
use tree::Tree;

/// Depth of the data tree: 2^32 positional note-commitment slots.
pub const DATA_TREE_DEPTH: u8 = 32;
/// Depth of the nullifier tree. Keyed by a full 128-bit nullifier, not a
/// positional index, so the tree must span the whole `u128` domain rather
/// than some dense prefix of it.
pub const NULL_TREE_DEPTH: u8 = 128;
/// Depth of the root tree. Keyed by `low_16` of a historical data-tree root
/// (uniformly distributed over `u128`), so it spans the same full domain as
/// the nullifier tree.
pub const ROOT_TREE_DEPTH: u8 = 128;

/// Observes commits to the world state. The only backend shipped here is
/// in-memory; a durable implementation (e.g. append-only WAL) can be
/// plugged in without touching callers.
pub trait Backend: Send + Sync {
    fn on_commit(&self, tree_id: TreeId, size: u64, root: Hash32);
}

/// A `Backend` that does nothing, used when no durable observer is wired in.
pub struct NullBackend;

impl Backend for NullBackend {
    fn on_commit(&self, _tree_id: TreeId, _size: u64, _root: Hash32) {}
}

pub struct WorldStateStore {
    data: Tree,
    nullifier: Tree,
    root: Tree,
    backend: Box<dyn Backend>,
}

impl WorldStateStore {
    pub fn new() -> Self {
        Self::with_backend(Box::new(NullBackend))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            data: Tree::new(DATA_TREE_DEPTH),
            nullifier: Tree::new(NULL_TREE_DEPTH),
            root: Tree::new(ROOT_TREE_DEPTH),
            backend,
        }
    }

    fn tree(&self, tree_id: TreeId) -> &Tree {
        match tree_id {
            TreeId::Data => &self.data,
            TreeId::Nullifier => &self.nullifier,
            TreeId::Root => &self.root,
        }
    }

    fn tree_mut(&mut self, tree_id: TreeId) -> &mut Tree {
        match tree_id {
            TreeId::Data => &mut self.data,
            TreeId::Nullifier => &mut self.nullifier,
            TreeId::Root => &mut self.root,
        }
    }

    pub fn size(&self, tree_id: TreeId) -> u64 {
        self.tree(tree_id).size()
    }

    pub fn root(&self, tree_id: TreeId) -> Hash32 {
        self.tree(tree_id).root()
    }

    pub fn get(&self, tree_id: TreeId, key: u128) -> Leaf {
        self.tree(tree_id).get(key)
    }

    pub fn put(&mut self, tree_id: TreeId, key: u128, value: Leaf) -> Result<(), StoreError> {
        self.tree_mut(tree_id).put(key, value)
    }

    pub fn get_hash_path(&self, tree_id: TreeId, key: u128) -> HashPath {
        self.tree(tree_id).hash_path(key)
    }

    /// Atomically promotes all staged mutations across all three trees.
    pub fn commit(&mut self) {
        for tree_id in TreeId::ALL {
            self.tree_mut(tree_id).commit();
            self.backend
                .on_commit(tree_id, self.tree(tree_id).size(), self.tree(tree_id).root());
        }
        debug!("world state committed");
    }

    /// Discards all staged mutations across all three trees.
    pub fn rollback(&mut self) {
        for tree_id in TreeId::ALL {
            self.tree_mut(tree_id).rollback();
        }
    }
}

impl Default for WorldStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_discards_mutations_across_all_trees() {
        let mut store = WorldStateStore::new();
        let root_before = store.root(TreeId::Data);
        store.put(TreeId::Data, 0, [1u8; 64]).unwrap();
        store.put(TreeId::Nullifier, 0, [2u8; 64]).unwrap();
        store.rollback();
        assert_eq!(store.root(TreeId::Data), root_before);
        assert_eq!(store.get(TreeId::Nullifier, 0), aggregator_types::zero_leaf());
    }

    #[test]
    fn commit_is_durable_across_further_rollbacks() {
        let mut store = WorldStateStore::new();
        store.put(TreeId::Data, 0, [1u8; 64]).unwrap();
        store.commit();
        let committed_root = store.root(TreeId::Data);
        store.put(TreeId::Data, 1, [2u8; 64]).unwrap();
        store.rollback();
        assert_eq!(store.root(TreeId::Data), committed_root);
    }
}
