use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("io error talking to prover: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame exceeded the maximum proof size")]
    FrameTooLarge,
}
