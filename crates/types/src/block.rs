use serde::{Deserialize, Serialize};

/// A rollup that has been confirmed on chain, decoded from the
/// `processRollup` call data of the transaction that carried it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub block_num: u64,
    pub created: u64,
    pub tx_hash: [u8; 32],
    pub rollup_proof_data: Vec<u8>,
    pub viewing_keys_data: Vec<u8>,
    pub rollup_id: u64,
    pub rollup_size: usize,
    pub data_start_index: u64,
    pub num_data_entries: u64,
    pub data_entries: Vec<[u8; 64]>,
    pub nullifiers: Vec<u128>,
}
