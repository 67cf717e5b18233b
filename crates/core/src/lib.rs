//! The aggregation pipeline's core stages: tx admission, batching, rollup
//! construction, and the single-writer state queue that serializes every
//! mutation to world state.

pub mod admission;
pub mod batch_controller;
pub mod error;
pub mod rollup_builder;
pub mod state_serializer;
pub mod verifier;

pub use admission::TxAdmission;
pub use batch_controller::{BatchController, BatchControllerConfig, StateWork};
pub use error::{AdmissionError, BuildError};
pub use rollup_builder::build_rollup;
pub use state_serializer::StateSerializer;
pub use verifier::{AcceptAllVerifier, JoinSplitVerifier};
