use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tree index {0} out of range, expected 0..3")]
    InvalidTreeId(u8),
    #[error("key {0} out of range for this tree (max index {1})")]
    KeyOutOfRange(u128, u128),
    #[error("lock poisoned while accessing world state")]
    LockPoisoned,
    #[error("backend error: {0}")]
    Backend(#[from] std::io::Error),
}
