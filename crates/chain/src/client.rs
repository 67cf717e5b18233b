use std::sync::Arc;
use std::time::Duration;

use ethers::middleware::SignerMiddleware;
use ethers::prelude::k256::ecdsa::SigningKey;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer, Wallet};
use ethers::types::{Address, Bytes, H256, U256};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::abi::{Erc20, RollupProcessor};
use crate::decode::decode_block;
use crate::error::ChainError;
use crate::signature::pad_signatures;
use aggregator_types::Block;

pub type Signed = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

#[derive(Debug, Clone)]
pub struct ContractStatus {
    pub next_rollup_id: u64,
    pub data_size: u64,
    pub data_root: [u8; 32],
    pub null_root: [u8; 32],
    pub root_root: [u8; 32],
}

#[derive(Debug, Clone)]
pub struct EscapeStatus {
    pub open: bool,
    pub blocks_remaining: u64,
}

/// Talks to the on-chain rollup processor and its supported ERC-20 assets.
/// Every call retries transient RPC failures with exponential backoff,
/// mirroring the retry posture of a long-lived chain client.
pub struct BlockchainAdapter {
    contract: RollupProcessor<Signed>,
    client: Arc<Signed>,
}

const MAX_RETRIES: u32 = 5;
const BASE_BACKOFF_MS: u64 = 200;

impl BlockchainAdapter {
    pub async fn new(
        rpc_url: &str,
        contract_address: Address,
        private_key: LocalWallet,
    ) -> Result<Self, ChainError> {
        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::Rpc(e.to_string()))?;
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let wallet = private_key.with_chain_id(chain_id.as_u64());
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = RollupProcessor::new(contract_address, client.clone());
        Ok(Self { contract, client })
    }

    async fn with_retry<T, Fut, F>(&self, what: &str, mut f: F) -> Result<T, ChainError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ChainError>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < MAX_RETRIES => {
                    attempt += 1;
                    let backoff = BASE_BACKOFF_MS * 2u64.pow(attempt);
                    warn!(%what, attempt, %err, "retrying after backoff");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn test_connection(&self) -> Result<(), ChainError> {
        self.client
            .get_block_number()
            .await
            .map(|_| ())
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    pub async fn status(&self) -> Result<ContractStatus, ChainError> {
        self.with_retry("status", || async {
            let next_rollup_id = self
                .contract
                .next_rollup_id()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            let data_size = self
                .contract
                .data_size()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            let data_root = self
                .contract
                .data_root()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            let null_root = self
                .contract
                .null_root()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            let root_root = self
                .contract
                .root_root()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            Ok(ContractStatus {
                next_rollup_id: next_rollup_id.as_u64(),
                data_size: data_size.as_u64(),
                data_root,
                null_root,
                root_root,
            })
        })
        .await
    }

    pub async fn escape_status(&self) -> Result<EscapeStatus, ChainError> {
        let (open, blocks_remaining) = self
            .contract
            .get_escape_hatch_status()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(EscapeStatus {
            open,
            blocks_remaining: blocks_remaining.as_u64(),
        })
    }

    pub async fn submit_rollup(
        &self,
        proof_data: Vec<u8>,
        signatures: &[Vec<u8>],
        sig_indexes: &[u64],
        viewing_keys: Vec<u8>,
        gas_limit: Option<U256>,
    ) -> Result<H256, ChainError> {
        let padded_signatures = pad_signatures(signatures)?;
        let sig_indexes: Vec<U256> = sig_indexes.iter().map(|i| U256::from(*i)).collect();

        let mut call = self.contract.process_rollup(
            Bytes::from(proof_data),
            Bytes::from(padded_signatures),
            sig_indexes,
            Bytes::from(viewing_keys),
        );
        if let Some(limit) = gas_limit {
            call = call.gas(limit);
        }
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        info!(%tx_hash, "submitted rollup");
        Ok(tx_hash)
    }

    /// Confirmed rollup blocks at or after `rollup_id`, requiring at least
    /// `min_confirmations` on top of the block that carried each one.
    pub async fn blocks_from(
        &self,
        rollup_id: u64,
        min_confirmations: u64,
    ) -> Result<Vec<Block>, ChainError> {
        let latest = self
            .client
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .as_u64();

        let filter = self
            .contract
            .event::<crate::abi::RollupProcessedFilter>()
            .from_block(0);
        let events = filter
            .query_with_meta()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        let mut blocks = Vec::new();
        for (event, meta) in events {
            if event.rollup_id.as_u64() < rollup_id {
                continue;
            }
            let block_num = meta.block_number.as_u64();
            if latest < block_num + min_confirmations {
                continue;
            }
            let tx = self
                .client
                .get_transaction(meta.transaction_hash)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?
                .ok_or(ChainError::MalformedCalldata)?;
            let header = self
                .client
                .get_block(block_num)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?
                .ok_or(ChainError::MalformedCalldata)?;
            let created = header.timestamp.as_u64();
            blocks.push(decode_block(&tx, block_num, created)?);
        }
        blocks.sort_by_key(|b| b.rollup_id);
        debug!(count = blocks.len(), "fetched confirmed rollup blocks");
        Ok(blocks)
    }

    pub async fn asset_balance(&self, asset: Address, holder: Address) -> Result<U256, ChainError> {
        let token = Erc20::new(asset, self.client.clone());
        token
            .balance_of(holder)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    pub async fn asset_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        let token = Erc20::new(asset, self.client.clone());
        token
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))
    }

    /// Polls for newly confirmed blocks every `poll_interval`, forwarding
    /// each to `tx` in rollup-id order. Exits once the receiver is dropped.
    pub async fn watch_blocks(
        self: Arc<Self>,
        tx: mpsc::UnboundedSender<Block>,
        poll_interval: Duration,
        min_confirmations: u64,
        cancel: CancellationToken,
    ) {
        let mut next_rollup_id = 0u64;
        loop {
            if cancel.is_cancelled() {
                debug!("block watcher cancelled");
                return;
            }
            match self.blocks_from(next_rollup_id, min_confirmations).await {
                Ok(blocks) => {
                    for block in blocks {
                        next_rollup_id = block.rollup_id + 1;
                        if tx.send(block).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => warn!(%err, "failed to poll for confirmed blocks"),
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("block watcher cancelled");
                    return;
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }
}
