//! Per-component configuration, loaded from the environment with a
//! per-module prefix, following the same shape each component's config
//! struct shares: a plain `Deserialize` struct plus a `PREFIX` constant.

pub mod error;

use serde::de::DeserializeOwned;

pub use error::ConfigError;

/// A config section loadable from its own env-var namespace, e.g.
/// `CHAIN_RPC_URL` for a section with `PREFIX = "CHAIN_"`.
pub trait ConfigSection: DeserializeOwned {
    const PREFIX: &'static str;

    fn from_env() -> Result<Self, ConfigError> {
        envy::prefixed(Self::PREFIX)
            .from_env::<Self>()
            .map_err(ConfigError::from)
    }
}

mod batch;
mod chain;
mod fees;
mod prover;

pub use batch::BatchControllerConfig;
pub use chain::ChainConfig;
pub use fees::FeesConfig;
pub use prover::ProverConfig;
