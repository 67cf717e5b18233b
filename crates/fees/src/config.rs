use serde::{Deserialize, Serialize};

/// Per-asset gas costs and pricing knobs, one entry per supported asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFeeConfig {
    pub asset_id: u32,
    pub decimals: u8,
    pub base_tx_gas: u64,
    pub max_fee_gas_price: u128,
    /// Scaled by 100 to preserve two fractional digits, e.g. 150 == 1.5x.
    pub fee_gas_price_multiplier_pct: u128,
    /// Extra gas per `TxType::ORDERED` index, on top of `base_tx_gas`.
    pub gas_constants: [u64; 7],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeCalculatorConfig {
    pub assets: Vec<AssetFeeConfig>,
    pub fee_free_assets: Vec<u32>,
    pub txs_per_rollup: u32,
    pub publish_interval_secs: u64,
    /// Priority tiers, 1.0 (no surplus required) down to 0.0 (maximum
    /// surplus required), highest priority first.
    pub surplus_ratios: Vec<f64>,
}

impl Default for FeeCalculatorConfig {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            fee_free_assets: Vec::new(),
            txs_per_rollup: 32,
            publish_interval_secs: 3600,
            surplus_ratios: vec![1.0, 0.9, 0.5, 0.0],
        }
    }
}
