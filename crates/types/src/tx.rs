use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Tags the kind of join-split proof, used for fee lookup and asset routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    Deposit,
    Transfer,
    WithdrawToWallet,
    WithdrawToContract,
    Account,
    DefiDeposit,
    DefiClaim,
}

impl TxType {
    /// Fixed enumeration order used by fee quote tables.
    pub const ORDERED: [TxType; 7] = [
        TxType::Deposit,
        TxType::Transfer,
        TxType::WithdrawToWallet,
        TxType::WithdrawToContract,
        TxType::Account,
        TxType::DefiDeposit,
        TxType::DefiClaim,
    ];

    /// Account proofs never pay a fee regardless of asset.
    pub fn is_fee_free(&self) -> bool {
        matches!(self, TxType::Account)
    }
}

/// A client-submitted join-split proof, parsed into the fields admission
/// and rollup construction need. The opaque proof bytes are carried through
/// untouched and handed to the prover and, eventually, the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSplitProof {
    pub proof_data: Bytes,
    pub tx_type: TxType,
    pub nullifier1: u128,
    pub nullifier2: u128,
    pub new_note1: [u8; 64],
    pub new_note2: [u8; 64],
    pub note_tree_root: [u8; 32],
    pub viewing_key1: Bytes,
    pub viewing_key2: Bytes,
    pub asset_id: u32,
    pub tx_fee: u128,
}

impl JoinSplitProof {
    /// Identifies this tx for logging and admission-record tracking.
    pub fn tx_id(&self) -> [u8; 32] {
        keccak_hash::keccak(&self.proof_data[..]).0
    }
}
