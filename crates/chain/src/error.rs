use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc request failed: {0}")]
    Rpc(String),
    #[error("contract call reverted: {0}")]
    Contract(String),
    #[error("call data did not decode as a processRollup invocation")]
    MalformedCalldata,
    #[error("signature has unexpected length {0}, expected 65")]
    BadSignatureLength(usize),
}
