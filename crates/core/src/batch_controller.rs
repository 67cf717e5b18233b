use std::time::{Duration, Instant};

use aggregator_queue::{Item, Sender, WorkQueue};
use aggregator_types::JoinSplitProof;
use tracing::{debug, info};

pub enum StateWork {
    Rollup(Vec<JoinSplitProof>),
    Block(aggregator_types::Block),
}

pub struct BatchControllerConfig {
    pub rollup_size: usize,
    pub max_rollup_wait_time: Duration,
    pub min_rollup_interval: Duration,
}

/// Consumes the tx queue and decides when a batch is ready to become a
/// rollup: on hitting `rollup_size`, on the flush sentinel, or once
/// `max_rollup_wait_time` has elapsed since the oldest tx still pending.
/// After dispatching a batch it sleeps `min_rollup_interval` before
/// pulling the next item, throttling how often rollups are produced.
pub struct BatchController {
    config: BatchControllerConfig,
    tx_queue: WorkQueue<JoinSplitProof>,
    state_queue: Sender<StateWork>,
}

impl BatchController {
    pub fn new(
        config: BatchControllerConfig,
        tx_queue: WorkQueue<JoinSplitProof>,
        state_queue: Sender<StateWork>,
    ) -> Self {
        Self {
            config,
            tx_queue,
            state_queue,
        }
    }

    pub async fn run(mut self) {
        let mut pending: Vec<JoinSplitProof> = Vec::new();
        let mut oldest_pending_at: Option<Instant> = None;

        loop {
            let timeout = match oldest_pending_at {
                Some(started) => self
                    .config
                    .max_rollup_wait_time
                    .saturating_sub(started.elapsed()),
                None => Duration::from_secs(3600),
            };

            let item = tokio::time::timeout(timeout, self.tx_queue.get()).await;

            let (mut flushed, mut timed_out) = (false, false);
            match item {
                Ok(Some(Item::Value(proof))) => {
                    if pending.is_empty() {
                        oldest_pending_at = Some(Instant::now());
                    }
                    pending.push(proof);
                }
                Ok(Some(Item::Flush)) => flushed = true,
                Ok(None) => return,
                Err(_) => timed_out = true,
            }

            let hit_size_cap = pending.len() >= self.config.rollup_size;
            let should_close = !pending.is_empty() && (flushed || hit_size_cap || timed_out);

            if should_close {
                let batch = std::mem::take(&mut pending);
                oldest_pending_at = None;
                let batch_len = batch.len();
                debug!(batch_len, "closing batch");
                self.state_queue.publish(StateWork::Rollup(batch));
                info!(batch_len, "dispatched batch to state queue");
                tokio::time::sleep(self.config.min_rollup_interval).await;
            }
        }
    }

    pub fn cancel_token(&self) -> tokio_util::sync::CancellationToken {
        self.tx_queue.cancel_token()
    }
}
