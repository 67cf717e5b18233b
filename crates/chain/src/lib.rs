//! On-chain adapter: submits rollup proofs to the rollup processor
//! contract, polls for confirmed blocks, and answers asset/escape-hatch
//! queries.

pub mod abi;
pub mod client;
pub mod decode;
pub mod error;
pub mod signature;

pub use client::{BlockchainAdapter, ContractStatus, EscapeStatus};
pub use error::ChainError;
