use aggregator_fees::{AssetFeeConfig, FeeCalculatorConfig};
use serde::Deserialize;

use crate::{ConfigError, ConfigSection};

/// Env-loadable mirror of `FeeCalculatorConfig`: the asset table and
/// surplus ratios are supplied as JSON since they don't fit a flat env-var
/// shape, everything else is a plain scalar.
#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    pub assets_json: String,
    #[serde(default = "default_fee_free_assets")]
    pub fee_free_assets_json: String,
    pub txs_per_rollup: u32,
    pub publish_interval_secs: u64,
    #[serde(default = "default_surplus_ratios")]
    pub surplus_ratios_json: String,
}

fn default_fee_free_assets() -> String {
    "[]".to_string()
}

fn default_surplus_ratios() -> String {
    "[1.0, 0.9, 0.5, 0.0]".to_string()
}

impl ConfigSection for FeesConfig {
    const PREFIX: &'static str = "FEES_";
}

impl FeesConfig {
    pub fn into_calculator_config(self) -> Result<FeeCalculatorConfig, ConfigError> {
        let assets: Vec<AssetFeeConfig> = serde_json::from_str(&self.assets_json)
            .map_err(|e| ConfigError::Invalid(format!("FEES_ASSETS_JSON: {e}")))?;
        let fee_free_assets: Vec<u32> = serde_json::from_str(&self.fee_free_assets_json)
            .map_err(|e| ConfigError::Invalid(format!("FEES_FEE_FREE_ASSETS_JSON: {e}")))?;
        let surplus_ratios: Vec<f64> = serde_json::from_str(&self.surplus_ratios_json)
            .map_err(|e| ConfigError::Invalid(format!("FEES_SURPLUS_RATIOS_JSON: {e}")))?;
        Ok(FeeCalculatorConfig {
            assets,
            fee_free_assets,
            txs_per_rollup: self.txs_per_rollup,
            publish_interval_secs: self.publish_interval_secs,
            surplus_ratios,
        })
    }
}
