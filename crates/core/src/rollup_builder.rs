use aggregator_store::WorldStateStore;
use aggregator_types::{HashPath, JoinSplitProof, Rollup, TreeId, low_16, marker_leaf};

use crate::error::BuildError;

/// Height (from the data-tree leaves) at which the sub-root spanning
/// exactly one rollup of size `rollup_size` lives.
fn rollup_root_height(rollup_size: usize) -> usize {
    (rollup_size as f64).log2() as usize + 1
}

/// Builds a `Rollup` witness out of a batch of admitted proofs. Stages
/// every effect the batch would have on world state, records the Merkle
/// paths the prover needs, then rolls the staging back -- the batch is not
/// actually applied until its block is confirmed on chain (see
/// `state_serializer::apply_block`).
///
/// A nullifier reused by two txs in the same batch is caught here (the
/// second tx observes its own nullifier already spent) and aborts the
/// whole batch.
pub fn build_rollup(
    store: &mut WorldStateStore,
    rollup_id: u64,
    rollup_size: usize,
    batch: Vec<JoinSplitProof>,
) -> Result<Rollup, BuildError> {
    let data_start_index = store.size(TreeId::Data);
    let old_data_root = store.root(TreeId::Data);
    let old_data_path = store.get_hash_path(TreeId::Data, data_start_index as u128);
    let old_null_root = store.root(TreeId::Nullifier);
    let old_root_root = store.root(TreeId::Root);

    let mut new_null_roots = Vec::with_capacity(batch.len() * 2);
    let mut old_null_paths = Vec::with_capacity(batch.len() * 2);
    let mut new_null_paths = Vec::with_capacity(batch.len() * 2);
    let mut old_root_paths = Vec::with_capacity(batch.len());

    let result = (|| -> Result<(), BuildError> {
        let mut next_index = data_start_index;
        for tx in &batch {
            store.put(TreeId::Data, next_index as u128, tx.new_note1)?;
            next_index += 1;
            store.put(TreeId::Data, next_index as u128, tx.new_note2)?;
            next_index += 1;

            for nullifier in [tx.nullifier1, tx.nullifier2] {
                if store.get(TreeId::Nullifier, nullifier) == marker_leaf() {
                    return Err(BuildError::DoubleSpendWithinBatch);
                }
                old_null_paths.push(store.get_hash_path(TreeId::Nullifier, nullifier));
                store.put(TreeId::Nullifier, nullifier, marker_leaf())?;
                new_null_roots.push(store.root(TreeId::Nullifier));
                new_null_paths.push(store.get_hash_path(TreeId::Nullifier, nullifier));
            }

            old_root_paths.push(
                store.get_hash_path(TreeId::Root, low_16(&tx.note_tree_root)),
            );
        }
        Ok(())
    })();

    if let Err(err) = result {
        store.rollback();
        return Err(err);
    }

    let new_data_path = store.get_hash_path(TreeId::Data, data_start_index as u128);
    let new_data_root = store.root(TreeId::Data);
    let rollup_root = sub_root(&new_data_path, rollup_size, data_start_index);

    store.rollback();

    Ok(Rollup {
        rollup_id,
        rollup_size,
        data_start_index,
        txs: batch,
        rollup_root,
        old_data_root,
        new_data_root,
        old_data_path,
        new_data_path,
        old_null_root,
        new_null_roots,
        old_null_paths,
        new_null_paths,
        old_root_root,
        old_root_paths,
    })
}

fn sub_root(
    path: &HashPath,
    rollup_size: usize,
    data_start_index: u64,
) -> aggregator_types::Hash32 {
    let height = rollup_root_height(rollup_size);
    path.sub_root_at(height, data_start_index)
        .unwrap_or(path.0.last().map(|pair| pair[0]).unwrap_or([0u8; 32]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregator_types::TxType;

    fn tx(n1: u128, n2: u128, root: [u8; 32]) -> JoinSplitProof {
        JoinSplitProof {
            proof_data: bytes::Bytes::new(),
            tx_type: TxType::Transfer,
            nullifier1: n1,
            nullifier2: n2,
            new_note1: [1; 64],
            new_note2: [2; 64],
            note_tree_root: root,
            viewing_key1: bytes::Bytes::new(),
            viewing_key2: bytes::Bytes::new(),
            asset_id: 0,
            tx_fee: 0,
        }
    }

    #[test]
    fn build_rollup_leaves_world_state_unchanged() {
        let mut store = WorldStateStore::new();
        let before_data = store.root(TreeId::Data);
        let before_null = store.root(TreeId::Nullifier);
        let before_root = store.root(TreeId::Root);

        let batch = vec![tx(1, 2, [0u8; 32])];
        let rollup = build_rollup(&mut store, 0, 2, batch).unwrap();
        assert_eq!(rollup.data_start_index, 0);

        assert_eq!(store.root(TreeId::Data), before_data);
        assert_eq!(store.root(TreeId::Nullifier), before_null);
        assert_eq!(store.root(TreeId::Root), before_root);
    }

    #[test]
    fn double_spend_within_batch_aborts_and_restores_state() {
        let mut store = WorldStateStore::new();
        let before = store.root(TreeId::Nullifier);
        let batch = vec![tx(1, 2, [0u8; 32]), tx(1, 3, [0u8; 32])];
        let result = build_rollup(&mut store, 0, 4, batch);
        assert!(matches!(result, Err(BuildError::DoubleSpendWithinBatch)));
        assert_eq!(store.root(TreeId::Nullifier), before);
    }
}
