use crate::{Hash32, HashPath, JoinSplitProof};

/// The witness handed to the proof generator: everything it needs to build
/// a single aggregated rollup proof out of a batch of join-split proofs.
/// Immutable once built; world-state mutation happens only later, when the
/// block this rollup produces is confirmed on chain.
#[derive(Debug, Clone)]
pub struct Rollup {
    pub rollup_id: u64,
    pub rollup_size: usize,
    pub data_start_index: u64,
    pub txs: Vec<JoinSplitProof>,

    pub rollup_root: Hash32,
    pub old_data_root: Hash32,
    pub new_data_root: Hash32,
    pub old_data_path: HashPath,
    pub new_data_path: HashPath,

    pub old_null_root: Hash32,
    pub new_null_roots: Vec<Hash32>,
    pub old_null_paths: Vec<HashPath>,
    pub new_null_paths: Vec<HashPath>,

    pub old_root_root: Hash32,
    pub old_root_paths: Vec<HashPath>,
}

impl Rollup {
    pub fn flattened_viewing_keys(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for tx in &self.txs {
            out.extend_from_slice(&tx.viewing_key1);
            out.extend_from_slice(&tx.viewing_key2);
        }
        out
    }
}
