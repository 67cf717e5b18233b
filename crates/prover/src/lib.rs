//! Client for the external circuit prover process. One rollup witness is
//! proven at a time; the prover never throws back into the pipeline, it
//! either returns proof bytes or `None`.

mod error;
mod framing;

pub use error::ProverError;

use std::sync::Arc;
use std::time::Duration;

use aggregator_types::Rollup;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use framing::{read_frame, write_frame};

/// Serializes a `Rollup` witness to the wire format the prover expects.
/// Kept intentionally simple: a length-prefixed concatenation of the
/// fields the prover needs, not a general codec.
pub fn encode_witness(rollup: &Rollup) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(rollup.rollup_id as u32).to_be_bytes());
    out.extend_from_slice(&(rollup.rollup_size as u32).to_be_bytes());
    out.extend_from_slice(&(rollup.data_start_index as u32).to_be_bytes());
    out.extend_from_slice(&(rollup.txs.len() as u32).to_be_bytes());
    for tx in &rollup.txs {
        out.extend_from_slice(&tx.proof_data);
    }
    out
}

pub struct ProverClient {
    addr: String,
    request_timeout: Duration,
    conn: Mutex<Option<TcpStream>>,
    cancel: CancellationToken,
}

impl ProverClient {
    pub fn new(addr: impl Into<String>, request_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            addr: addr.into(),
            request_timeout,
            conn: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    async fn connection(&self) -> Result<(), ProverError> {
        let mut guard = self.conn.lock().await;
        if guard.is_none() {
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(ProverError::Io)?;
            *guard = Some(stream);
        }
        Ok(())
    }

    /// Sends a rollup witness to the prover and waits for a proof. Returns
    /// `None` if the prover is cancelled, times out, or reports a failure
    /// to prove -- never an error the caller has to propagate, matching
    /// the contract that a failed proof simply drops the batch.
    pub async fn create_proof(&self, rollup: &Rollup) -> Option<Vec<u8>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let witness = encode_witness(rollup);

        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(rollup_id = rollup.rollup_id, "proof request cancelled");
                None
            }
            result = tokio::time::timeout(self.request_timeout, self.request(&witness)) => {
                match result {
                    Ok(Some(proof)) => Some(proof),
                    Ok(None) => {
                        warn!(rollup_id = rollup.rollup_id, "prover returned no proof");
                        None
                    }
                    Err(_) => {
                        warn!(rollup_id = rollup.rollup_id, "prover request timed out");
                        None
                    }
                }
            }
        }
    }

    async fn request(&self, witness: &[u8]) -> Option<Vec<u8>> {
        self.connection().await.ok()?;
        let mut guard = self.conn.lock().await;
        let stream = guard.as_mut()?;
        match write_frame(stream, witness).await {
            Ok(()) => {}
            Err(_) => {
                *guard = None;
                return None;
            }
        }
        match read_frame(stream).await {
            Ok(proof) => Some(proof),
            Err(_) => {
                *guard = None;
                None
            }
        }
    }
}
