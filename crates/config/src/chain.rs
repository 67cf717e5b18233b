use serde::Deserialize;

use crate::ConfigSection;

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub rollup_processor_address: String,
    pub private_key: String,
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_min_confirmations() -> u64 {
    3
}

fn default_poll_interval_ms() -> u64 {
    12_000
}

impl ConfigSection for ChainConfig {
    const PREFIX: &'static str = "CHAIN_";
}
