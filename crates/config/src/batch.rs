use serde::Deserialize;

use crate::{ConfigError, ConfigSection};

#[derive(Debug, Clone, Deserialize)]
pub struct BatchControllerConfig {
    pub rollup_size: usize,
    pub max_rollup_wait_time_ms: u64,
    pub min_rollup_interval_ms: u64,
}

impl ConfigSection for BatchControllerConfig {
    const PREFIX: &'static str = "BATCH_";
}

impl BatchControllerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rollup_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "BATCH_ROLLUP_SIZE must be a power of two".to_string(),
            ));
        }
        if self.min_rollup_interval_ms > self.max_rollup_wait_time_ms {
            return Err(ConfigError::Invalid(
                "BATCH_MIN_ROLLUP_INTERVAL_MS must not exceed BATCH_MAX_ROLLUP_WAIT_TIME_MS"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
