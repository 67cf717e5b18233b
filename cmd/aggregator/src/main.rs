mod cli;
mod env_file;
mod tracing_init;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use aggregator_chain::BlockchainAdapter;
use aggregator_config::{BatchControllerConfig as EnvBatchConfig, ChainConfig, ConfigSection, FeesConfig, ProverConfig};
use aggregator_core::batch_controller::{BatchController, BatchControllerConfig, StateWork};
use aggregator_core::admission::TxAdmission;
use aggregator_core::state_serializer::StateSerializer;
use aggregator_core::verifier::AcceptAllVerifier;
use aggregator_fees::FeeCalculator;
use aggregator_prover::ProverClient;
use aggregator_queue::WorkQueue;
use aggregator_store::WorldStateStore;
use clap::Parser;
use ethers::signers::LocalWallet;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::Options;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _filter_handle = tracing_init::init_tracing();
    let opts = Options::parse();

    if let Some(path) = opts.env_file.as_deref() {
        env_file::load(path)?;
    }

    if let Err(err) = run().await {
        error!(%err, "aggregator exited with an error");
        return Err(err);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let chain_config = ChainConfig::from_env()?;
    let prover_config = ProverConfig::from_env()?;
    let fees_config = FeesConfig::from_env()?;
    let batch_env_config = EnvBatchConfig::from_env()?;
    batch_env_config.validate()?;

    let wallet = LocalWallet::from_str(chain_config.private_key.trim_start_matches("0x"))?;
    let rollup_processor_address = chain_config.rollup_processor_address.parse()?;
    let chain = Arc::new(
        BlockchainAdapter::new(&chain_config.rpc_url, rollup_processor_address, wallet).await?,
    );
    chain.test_connection().await?;
    let status = chain.status().await?;
    info!(next_rollup_id = status.next_rollup_id, "connected to rollup processor");

    let prover = ProverClient::new(
        prover_config.addr.clone(),
        Duration::from_millis(prover_config.request_timeout_ms),
    );

    let _fee_calculator_config = fees_config.into_calculator_config()?;
    // FeeCalculator is wired in by the RPC surface that quotes fees to
    // clients, which is out of scope here; constructing it early catches
    // a malformed FEES_* configuration at startup.
    let _ = FeeCalculator::new(_fee_calculator_config, Box::new(NoopOracle));

    let store = Arc::new(RwLock::new(WorldStateStore::new()));

    let tx_queue: WorkQueue<aggregator_types::JoinSplitProof> = WorkQueue::new();
    let state_queue: WorkQueue<StateWork> = WorkQueue::new();
    let block_feed_cancel = CancellationToken::new();

    let admission = Arc::new(TxAdmission::new(
        store.clone(),
        Arc::new(AcceptAllVerifier),
        tx_queue.sender(),
    ));

    let block_feed_sender = state_queue.sender();

    let batch_controller = BatchController::new(
        BatchControllerConfig {
            rollup_size: batch_env_config.rollup_size,
            max_rollup_wait_time: Duration::from_millis(batch_env_config.max_rollup_wait_time_ms),
            min_rollup_interval: Duration::from_millis(batch_env_config.min_rollup_interval_ms),
        },
        tx_queue,
        state_queue.sender(),
    );
    let tx_queue_cancel = batch_controller.cancel_token();

    let state_serializer = StateSerializer::new(
        store,
        state_queue,
        prover.clone(),
        chain.clone(),
        status.next_rollup_id,
        batch_env_config.rollup_size,
    );
    let state_queue_cancel = state_serializer.cancel_token();

    let (block_tx, block_feed) = spawn_block_feed(
        chain.clone(),
        block_feed_sender,
        Duration::from_millis(chain_config.poll_interval_ms),
        chain_config.min_confirmations,
        block_feed_cancel.clone(),
    );

    let batch_task = tokio::spawn(batch_controller.run());
    let serializer_task = tokio::spawn(state_serializer.run());

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, cancelling all pipeline stages");

    tx_queue_cancel.cancel();
    state_queue_cancel.cancel();
    prover.cancel();
    block_feed_cancel.cancel();
    drop(block_tx);
    drop(admission);

    let (batch_result, serializer_result, block_feed_result) =
        tokio::join!(batch_task, serializer_task, block_feed);
    for result in [batch_result, serializer_result, block_feed_result] {
        if let Err(err) = result {
            error!(%err, "pipeline task panicked during shutdown");
        }
    }
    info!("shutdown complete");
    Ok(())
}

/// Bridges confirmed rollup blocks from the chain adapter's polling loop
/// into the state queue as `StateWork::Block` items, letting the state
/// serializer be the only thing that ever touches world state. Both the
/// watcher and the forwarding loop observe `cancel` so shutdown doesn't
/// have to wait out a full poll interval.
fn spawn_block_feed(
    chain: Arc<BlockchainAdapter>,
    state_queue: aggregator_queue::Sender<StateWork>,
    poll_interval: Duration,
    min_confirmations: u64,
    cancel: CancellationToken,
) -> (tokio::sync::mpsc::UnboundedSender<aggregator_types::Block>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let watcher_tx = tx.clone();
    tokio::spawn(chain.watch_blocks(watcher_tx, poll_interval, min_confirmations, cancel.clone()));
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                block = rx.recv() => match block {
                    Some(block) => state_queue.publish(StateWork::Block(block)),
                    None => return,
                },
            }
        }
    });
    (tx, handle)
}

struct NoopOracle;

impl aggregator_fees::PriceTracker for NoopOracle {
    fn asset_price(&self, _asset_id: u32) -> u128 {
        0
    }
    fn gas_price(&self) -> u128 {
        0
    }
}
