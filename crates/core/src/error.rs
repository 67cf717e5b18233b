use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("nullifier already exists")]
    NullifierExists,
    #[error("merkle root does not exist")]
    UnknownNoteRoot,
    #[error("proof verification failed")]
    VerifierFailed,
    #[error("world state error: {0}")]
    Store(#[from] aggregator_store::StoreError),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("batch aborted: nullifier reused within the same batch")]
    DoubleSpendWithinBatch,
    #[error("world state error: {0}")]
    Store(#[from] aggregator_store::StoreError),
}
