//! Converts on-chain gas cost into per-asset fees via a price oracle, and
//! scores how far a candidate batch sits above the minimum fee bar.

mod config;
mod oracle;

pub use config::{AssetFeeConfig, FeeCalculatorConfig};
pub use oracle::PriceTracker;

use aggregator_types::{JoinSplitProof, TxType};

#[derive(Debug, Clone, Copy)]
pub struct BaseFeeQuote {
    pub fee: u128,
    pub settlement_time_secs: u64,
}

#[derive(Debug, Clone)]
pub struct FeeQuotes {
    /// One entry per `TxType::ORDERED`.
    pub fee_constants: [u128; 7],
    /// One entry per configured surplus ratio, highest priority first.
    pub base_fee_quotes: Vec<BaseFeeQuote>,
}

pub struct FeeCalculator {
    config: FeeCalculatorConfig,
    oracle: Box<dyn PriceTracker>,
}

impl FeeCalculator {
    pub fn new(config: FeeCalculatorConfig, oracle: Box<dyn PriceTracker>) -> Self {
        Self { config, oracle }
    }

    fn asset(&self, asset_id: u32) -> Option<&AssetFeeConfig> {
        self.config.assets.iter().find(|a| a.asset_id == asset_id)
    }

    /// Converts a gas amount into units of `asset_id`, applying both the
    /// operator-configured price multiplier and hard cap.
    pub fn to_asset_price(&self, asset_id: u32, gas: u64) -> u128 {
        let Some(asset) = self.asset(asset_id) else {
            return 0;
        };
        let oracle_price = self.oracle.asset_price(asset_id);
        if oracle_price == 0 {
            return 0;
        }
        let scaled = (gas as u128) * 10u128.pow(asset.decimals as u32);
        let capped_by_market = scaled
            .saturating_mul(self.oracle.gas_price())
            .saturating_mul(asset.fee_gas_price_multiplier_pct)
            / 100;
        // `max_fee_gas_price == 0` means no cap is configured, not "cap at
        // zero" -- a zero cap would make every fee permanently zero.
        let bounded = if asset.max_fee_gas_price == 0 {
            capped_by_market
        } else {
            std::cmp::min(scaled.saturating_mul(asset.max_fee_gas_price), capped_by_market)
        };
        bounded / oracle_price
    }

    /// The inverse of `to_asset_price`: converts an asset-denominated fee
    /// back into native-asset (ETH) units.
    pub fn to_eth_price(&self, asset_id: u32, value: u128) -> u128 {
        let Some(asset) = self.asset(asset_id) else {
            return 0;
        };
        let oracle_price = self.oracle.asset_price(asset_id);
        value.saturating_mul(oracle_price) / 10u128.pow(asset.decimals as u32)
    }

    fn gas_for(&self, asset: &AssetFeeConfig, tx_type: TxType) -> u64 {
        asset.base_tx_gas + asset.gas_constants[tx_index(tx_type)]
    }

    /// The minimum fee a proof of `tx_type` must pay in `asset_id`. Zero
    /// for fee-free tx types or assets.
    pub fn min_tx_fee(&self, asset_id: u32, tx_type: TxType) -> u128 {
        if tx_type.is_fee_free() || self.config.fee_free_assets.contains(&asset_id) {
            return 0;
        }
        let Some(asset) = self.asset(asset_id) else {
            return 0;
        };
        self.to_asset_price(asset_id, self.gas_for(asset, tx_type))
    }

    /// Per-tx-type fee constants plus a priority-tiered base fee table for
    /// `asset_id`, following the configured surplus ratios.
    pub fn fee_quotes(&self, asset_id: u32) -> Option<FeeQuotes> {
        let asset = self.asset(asset_id)?;
        let mut fee_constants = [0u128; 7];
        for (i, tx_type) in TxType::ORDERED.iter().enumerate() {
            fee_constants[i] = self.min_tx_fee(asset_id, *tx_type);
        }
        let base_fee = self.to_asset_price(asset_id, asset.base_tx_gas);

        let base_fee_quotes = self
            .config
            .surplus_ratios
            .iter()
            .map(|ratio| {
                let extra_txs = round_half_up(
                    self.config.txs_per_rollup as f64 * (1.0 - ratio),
                );
                let fee = base_fee.saturating_mul(1 + extra_txs as u128);
                let settlement_time_secs = std::cmp::max(
                    300,
                    (self.config.publish_interval_secs as f64 * ratio) as u64,
                );
                BaseFeeQuote {
                    fee,
                    settlement_time_secs,
                }
            })
            .collect();

        Some(FeeQuotes {
            fee_constants,
            base_fee_quotes,
        })
    }

    /// How far above the minimum fee bar a candidate batch sits, in
    /// `[0, 1]`. `1.0` means every tx paid exactly the minimum; `0.0` means
    /// the batch collectively paid at least `txsPerRollup` times the base
    /// fee in surplus.
    pub fn surplus_ratio(&self, txs: &[JoinSplitProof]) -> f64 {
        if txs.is_empty() {
            return 1.0;
        }
        let mut surplus_eth = 0i128;
        for tx in txs {
            if tx.tx_type.is_fee_free() {
                continue;
            }
            let min_fee = self.min_tx_fee(tx.asset_id, tx.tx_type);
            let min_fee_eth = self.to_eth_price(tx.asset_id, min_fee) as i128;
            let tx_fee_eth = self.to_eth_price(tx.asset_id, tx.tx_fee) as i128;
            surplus_eth += tx_fee_eth - min_fee_eth;
        }
        let Some(reference_asset) = self.config.assets.first() else {
            return 1.0;
        };
        let base_fee_eth = self.to_eth_price(
            reference_asset.asset_id,
            self.to_asset_price(reference_asset.asset_id, reference_asset.base_tx_gas),
        ) as i128;
        let denominator = base_fee_eth * self.config.txs_per_rollup as i128;
        if denominator == 0 {
            return 1.0;
        }
        let ratio = 1.0 - (surplus_eth as f64 / denominator as f64);
        ratio.clamp(0.0, 1.0)
    }
}

fn tx_index(tx_type: TxType) -> usize {
    TxType::ORDERED
        .iter()
        .position(|t| *t == tx_type)
        .expect("TxType::ORDERED covers every variant")
}

fn round_half_up(value: f64) -> u64 {
    (value + 0.5).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggregator_types::JoinSplitProof;

    struct FixedOracle {
        price: u128,
        gas_price: u128,
    }

    impl PriceTracker for FixedOracle {
        fn asset_price(&self, _asset_id: u32) -> u128 {
            self.price
        }
        fn gas_price(&self) -> u128 {
            self.gas_price
        }
    }

    fn calculator() -> FeeCalculator {
        let config = FeeCalculatorConfig {
            assets: vec![AssetFeeConfig {
                asset_id: 0,
                decimals: 18,
                base_tx_gas: 10_000,
                max_fee_gas_price: 0,
                fee_gas_price_multiplier_pct: 100,
                gas_constants: [0; 7],
            }],
            fee_free_assets: vec![],
            txs_per_rollup: 10,
            publish_interval_secs: 600,
            surplus_ratios: vec![1.0, 0.9, 0.5, 0.0],
        };
        FeeCalculator::new(
            config,
            Box::new(FixedOracle {
                price: 1_000_000_000_000_000_000,
                gas_price: 2,
            }),
        )
    }

    #[test]
    fn fee_quotes_match_the_documented_shape() {
        let calc = calculator();
        let quotes = calc.fee_quotes(0).unwrap();
        let base = quotes.base_fee_quotes[0].fee;
        assert_eq!(quotes.base_fee_quotes[1].fee, base * 2);
        assert_eq!(quotes.base_fee_quotes[2].fee, base * 6);
        assert_eq!(quotes.base_fee_quotes[3].fee, base * 11);
        assert_eq!(quotes.base_fee_quotes[0].settlement_time_secs, 600);
        assert_eq!(quotes.base_fee_quotes[3].settlement_time_secs, 300);
    }

    #[test]
    fn surplus_ratio_of_empty_batch_is_one() {
        let calc = calculator();
        assert_eq!(calc.surplus_ratio(&[]), 1.0);
    }

    fn sample_tx(fee: u128) -> JoinSplitProof {
        JoinSplitProof {
            proof_data: bytes::Bytes::new(),
            tx_type: TxType::Transfer,
            nullifier1: 1,
            nullifier2: 2,
            new_note1: [0; 64],
            new_note2: [0; 64],
            note_tree_root: [0; 32],
            viewing_key1: bytes::Bytes::new(),
            viewing_key2: bytes::Bytes::new(),
            asset_id: 0,
            tx_fee: fee,
        }
    }

    #[test]
    fn surplus_ratio_decreases_as_fees_increase() {
        let calc = calculator();
        let min_fee = calc.min_tx_fee(0, TxType::Transfer);
        let low = calc.surplus_ratio(&[sample_tx(min_fee)]);
        let high = calc.surplus_ratio(&[sample_tx(min_fee * 5)]);
        assert!(high < low);
    }
}
