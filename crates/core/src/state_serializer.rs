use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use aggregator_chain::BlockchainAdapter;
use aggregator_prover::ProverClient;
use aggregator_queue::{Item, WorkQueue};
use aggregator_store::WorldStateStore;
use aggregator_types::{Block, TreeId, low_16, marker_leaf, zero_leaf};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::batch_controller::StateWork;
use crate::rollup_builder::build_rollup;

/// The single writer to world state: consumes batch-closed rollups (build
/// a witness, prove it, submit it) and confirmed blocks (apply their
/// effects and commit) off one queue, so no two world-state mutations ever
/// run concurrently.
pub struct StateSerializer {
    store: Arc<RwLock<WorldStateStore>>,
    queue: WorkQueue<StateWork>,
    prover: Arc<ProverClient>,
    chain: Arc<BlockchainAdapter>,
    next_rollup_id: AtomicU64,
    rollup_size: usize,
}

impl StateSerializer {
    pub fn new(
        store: Arc<RwLock<WorldStateStore>>,
        queue: WorkQueue<StateWork>,
        prover: Arc<ProverClient>,
        chain: Arc<BlockchainAdapter>,
        starting_rollup_id: u64,
        rollup_size: usize,
    ) -> Self {
        Self {
            store,
            queue,
            prover,
            chain,
            next_rollup_id: AtomicU64::new(starting_rollup_id),
            rollup_size,
        }
    }

    pub fn cancel_token(&self) -> tokio_util::sync::CancellationToken {
        self.queue.cancel_token()
    }

    pub async fn run(mut self) {
        loop {
            let outcome = match self.queue.get().await {
                Some(Item::Value(StateWork::Rollup(batch))) => self.handle_rollup(batch).await,
                Some(Item::Value(StateWork::Block(block))) => self.handle_block(block).await,
                Some(Item::Flush) => continue,
                None => {
                    info!("state queue cancelled, state serializer exiting");
                    return;
                }
            };
            if outcome.is_err() {
                error!("world state unreadable/unwritable, halting state queue for restart");
                self.queue.cancel();
                return;
            }
        }
    }

    /// Builds, proves and submits one rollup. A `StoreError` here means
    /// world state itself is unreadable or unwritable, which is fatal; any
    /// other failure (double spend, prover rejection, submission failure)
    /// only drops this one batch.
    async fn handle_rollup(&self, batch: Vec<aggregator_types::JoinSplitProof>) -> Result<(), ()> {
        let rollup_id = self.next_rollup_id.fetch_add(1, Ordering::SeqCst);

        let rollup = {
            let mut store = self.store.write().await;
            match build_rollup(&mut store, rollup_id, self.rollup_size, batch) {
                Ok(rollup) => rollup,
                Err(err @ crate::error::BuildError::Store(_)) => {
                    error!(%err, "world state error while constructing rollup");
                    return Err(());
                }
                Err(err) => {
                    error!(%err, "batch aborted during rollup construction");
                    return Ok(());
                }
            }
        };

        let Some(proof_bytes) = self.prover.create_proof(&rollup).await else {
            warn!(rollup_id, "invalid proof, dropping batch");
            return Ok(());
        };

        let signatures: Vec<Vec<u8>> = Vec::new();
        let sig_indexes: Vec<u64> = Vec::new();
        if let Err(err) = self
            .chain
            .submit_rollup(
                proof_bytes,
                &signatures,
                &sig_indexes,
                rollup.flattened_viewing_keys(),
                None,
            )
            .await
        {
            error!(%err, rollup_id, "failed to submit rollup to chain");
        }
        Ok(())
    }

    /// Applies a confirmed block's effects to world state. Every failure
    /// here is a `StoreError` against world state itself, which is fatal.
    async fn handle_block(&self, block: Block) -> Result<(), ()> {
        let mut store = self.store.write().await;

        for (i, entry) in block.data_entries.iter().enumerate() {
            if let Err(err) = store.put(
                TreeId::Data,
                (block.data_start_index + i as u64) as u128,
                *entry,
            ) {
                error!(%err, "failed to insert data entry, halting state queue");
                return Err(());
            }
        }
        if (block.data_entries.len() as u64) < block.num_data_entries {
            let pad_index = block.data_start_index + block.num_data_entries - 1;
            if let Err(err) = store.put(TreeId::Data, pad_index as u128, zero_leaf()) {
                error!(%err, "failed to pad data tree, halting state queue");
                return Err(());
            }
        }

        let new_data_root = store.root(TreeId::Data);
        if let Err(err) = store.put(TreeId::Root, low_16(&new_data_root), marker_leaf()) {
            error!(%err, "failed to register new data root, halting state queue");
            return Err(());
        }

        for nullifier in &block.nullifiers {
            if let Err(err) = store.put(TreeId::Nullifier, *nullifier, marker_leaf()) {
                error!(%err, "failed to insert nullifier, halting state queue");
                return Err(());
            }
        }

        store.commit();
        info!(
            rollup_id = block.rollup_id,
            block_num = block.block_num,
            "applied confirmed block"
        );
        Ok(())
    }
}
