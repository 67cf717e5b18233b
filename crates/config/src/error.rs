#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error deserializing config from env: {0}")]
    Deserialization(#[from] envy::Error),
    #[error("{0}")]
    Invalid(String),
}
