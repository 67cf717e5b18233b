use serde::Deserialize;

use crate::ConfigSection;

#[derive(Debug, Clone, Deserialize)]
pub struct ProverConfig {
    pub addr: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    60_000
}

impl ConfigSection for ProverConfig {
    const PREFIX: &'static str = "PROVER_";
}
