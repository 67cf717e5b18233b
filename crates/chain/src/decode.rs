use ethers::abi::AbiDecode;
use ethers::types::Transaction;

use crate::abi::ProcessRollupCall;
use crate::error::ChainError;
use aggregator_types::Block;

/// Header layout of the rollup proof's public inputs, as produced by the
/// circuit: `rollupId, rollupSize, dataStartIndex, numDataEntries` as
/// big-endian u32s, followed by `numDataEntries` 64-byte data entries and
/// then `numDataEntries` 16-byte (low-128-bit) nullifiers.
const HEADER_LEN: usize = 16;

/// Decodes a confirmed `processRollup` transaction into a `Block`, reading
/// the rollup's public-input header and entry lists out of the proof data
/// the way the on-chain verifier itself does.
pub fn decode_block(tx: &Transaction, block_num: u64, created: u64) -> Result<Block, ChainError> {
    let call =
        ProcessRollupCall::decode(tx.input.as_ref()).map_err(|_| ChainError::MalformedCalldata)?;

    let proof_data = call.proof_data.to_vec();
    if proof_data.len() < HEADER_LEN {
        return Err(ChainError::MalformedCalldata);
    }
    let rollup_id = u32::from_be_bytes(proof_data[0..4].try_into().unwrap()) as u64;
    let rollup_size = u32::from_be_bytes(proof_data[4..8].try_into().unwrap()) as usize;
    let data_start_index = u32::from_be_bytes(proof_data[8..12].try_into().unwrap()) as u64;
    let num_data_entries = u32::from_be_bytes(proof_data[12..16].try_into().unwrap()) as u64;

    let entries_len = num_data_entries as usize * 64;
    let entries_end = HEADER_LEN + entries_len;
    let nullifiers_end = entries_end + num_data_entries as usize * 16;
    if proof_data.len() < nullifiers_end {
        return Err(ChainError::MalformedCalldata);
    }

    let mut data_entries = Vec::with_capacity(num_data_entries as usize);
    for chunk in proof_data[HEADER_LEN..entries_end].chunks_exact(64) {
        let mut leaf = [0u8; 64];
        leaf.copy_from_slice(chunk);
        data_entries.push(leaf);
    }

    let mut nullifiers = Vec::with_capacity(num_data_entries as usize);
    for chunk in proof_data[entries_end..nullifiers_end].chunks_exact(16) {
        nullifiers.push(u128::from_be_bytes(chunk.try_into().unwrap()));
    }

    Ok(Block {
        block_num,
        created,
        tx_hash: tx.hash.0,
        rollup_proof_data: proof_data,
        viewing_keys_data: call.viewing_keys.to_vec(),
        rollup_id,
        rollup_size,
        data_start_index,
        num_data_entries,
        data_entries,
        nullifiers,
    })
}

/// Encodes a rollup proof's public-input header and entry lists, matching
/// the layout `decode_block` reads. Used by test fakes that stand in for
/// the circuit prover.
pub fn encode_header(
    rollup_id: u64,
    rollup_size: usize,
    data_start_index: u64,
    data_entries: &[[u8; 64]],
    nullifiers: &[u128],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + data_entries.len() * 64 + nullifiers.len() * 16);
    out.extend_from_slice(&(rollup_id as u32).to_be_bytes());
    out.extend_from_slice(&(rollup_size as u32).to_be_bytes());
    out.extend_from_slice(&(data_start_index as u32).to_be_bytes());
    out.extend_from_slice(&(data_entries.len() as u32).to_be_bytes());
    for entry in data_entries {
        out.extend_from_slice(entry);
    }
    for nullifier in nullifiers {
        out.extend_from_slice(&nullifier.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_manual_parse() {
        let entries = vec![[1u8; 64], [2u8; 64]];
        let nullifiers = vec![10u128, 20u128];
        let encoded = encode_header(7, 4, 100, &entries, &nullifiers);
        assert_eq!(u32::from_be_bytes(encoded[0..4].try_into().unwrap()), 7);
        assert_eq!(u32::from_be_bytes(encoded[4..8].try_into().unwrap()), 4);
        assert_eq!(u32::from_be_bytes(encoded[8..12].try_into().unwrap()), 100);
        assert_eq!(u32::from_be_bytes(encoded[12..16].try_into().unwrap()), 2);
    }
}
