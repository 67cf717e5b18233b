use std::sync::Arc;

use aggregator_queue::Sender;
use aggregator_store::WorldStateStore;
use aggregator_types::{JoinSplitProof, TreeId, low_16, zero_leaf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AdmissionError;
use crate::verifier::JoinSplitVerifier;

/// Validates incoming join-split proofs against committed world state and,
/// on success, publishes them onto the tx queue. Reads are against the
/// last committed snapshot only -- admission never observes a batch's
/// staged, not-yet-confirmed effects.
pub struct TxAdmission<V: JoinSplitVerifier> {
    store: Arc<RwLock<WorldStateStore>>,
    verifier: Arc<V>,
    tx_queue: Sender<JoinSplitProof>,
}

impl<V: JoinSplitVerifier> TxAdmission<V> {
    pub fn new(
        store: Arc<RwLock<WorldStateStore>>,
        verifier: Arc<V>,
        tx_queue: Sender<JoinSplitProof>,
    ) -> Self {
        Self {
            store,
            verifier,
            tx_queue,
        }
    }

    pub async fn admit(&self, proof: JoinSplitProof) -> Result<(), AdmissionError> {
        {
            let store = self.store.read().await;
            if store.get(TreeId::Nullifier, proof.nullifier1) != zero_leaf()
                || store.get(TreeId::Nullifier, proof.nullifier2) != zero_leaf()
            {
                warn!(tx_id = ?proof.tx_id(), "rejected: nullifier already exists");
                return Err(AdmissionError::NullifierExists);
            }
            let root_key = low_16(&proof.note_tree_root);
            if store.get(TreeId::Root, root_key) == zero_leaf() {
                warn!(tx_id = ?proof.tx_id(), "rejected: unknown note root");
                return Err(AdmissionError::UnknownNoteRoot);
            }
        }

        if !self.verifier.verify(&proof) {
            warn!(tx_id = ?proof.tx_id(), "rejected: proof verification failed");
            return Err(AdmissionError::VerifierFailed);
        }

        debug!(tx_id = ?proof.tx_id(), "admitted");
        self.tx_queue.publish(proof);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::AcceptAllVerifier;
    use aggregator_queue::{Item, WorkQueue};
    use aggregator_types::TxType;

    fn sample_proof(root: [u8; 32], n1: u128, n2: u128) -> JoinSplitProof {
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

    #[tokio::test]
    async fn rejects_unknown_note_root() {
        let store = Arc::new(RwLock::new(WorldStateStore::new()));
        let mut queue: WorkQueue<JoinSplitProof> = WorkQueue::new();
        let admission = TxAdmission::new(store, Arc::new(AcceptAllVerifier), queue.sender());

        let result = admission.admit(sample_proof([9u8; 32], 1, 2)).await;
        assert!(matches!(result, Err(AdmissionError::UnknownNoteRoot)));
        drop(admission);
        queue.cancel();
        assert!(queue.get().await.is_none());
    }

    #[tokio::test]
    async fn admits_and_enqueues_a_valid_proof() {
        let store = Arc::new(RwLock::new(WorldStateStore::new()));
        let root = {
            let mut s = store.write().await;
            let root = s.root(TreeId::Data);
            s.put(TreeId::Root, low_16(&root), aggregator_types::marker_leaf())
                .unwrap();
            s.commit();
            root
        };
        let mut queue: WorkQueue<JoinSplitProof> = WorkQueue::new();
        let admission = TxAdmission::new(store, Arc::new(AcceptAllVerifier), queue.sender());

        admission.admit(sample_proof(root, 1, 2)).await.unwrap();
        match queue.get().await {
            Some(Item::Value(proof)) => assert_eq!(proof.nullifier1, 1),
            other => panic!("expected admitted proof, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_already_spent_nullifier() {
        let store = Arc::new(RwLock::new(WorldStateStore::new()));
        let root = {
            let mut s = store.write().await;
            let root = s.root(TreeId::Data);
            s.put(TreeId::Root, low_16(&root), aggregator_types::marker_leaf())
                .unwrap();
            s.put(TreeId::Nullifier, 1, aggregator_types::marker_leaf())
                .unwrap();
            s.commit();
            root
        };
        let queue: WorkQueue<JoinSplitProof> = WorkQueue::new();
        let admission = TxAdmission::new(store, Arc::new(AcceptAllVerifier), queue.sender());

        let result = admission.admit(sample_proof(root, 1, 2)).await;
        assert!(matches!(result, Err(AdmissionError::NullifierExists)));
    }
}
