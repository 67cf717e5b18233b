use clap::Parser;

/// Runs the rollup aggregation server: admits client proofs, batches them
/// into rollups, proves them, and submits them on chain.
#[derive(Parser, Debug)]
#[command(name = "aggregator", version, about)]
pub struct Options {
    /// Path to a `.env`-style file to load before reading component
    /// configuration from the environment.
    #[arg(long, env = "ENV_FILE")]
    pub env_file: Option<String>,
}
