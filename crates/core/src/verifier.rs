use aggregator_types::JoinSplitProof;

/// Verifies a join-split proof. The actual zero-knowledge verifier lives
/// outside this crate; this seam lets admission stay agnostic to which
/// circuit backend is wired in.
pub trait JoinSplitVerifier: Send + Sync {
    fn verify(&self, proof: &JoinSplitProof) -> bool;
}

/// A verifier that accepts everything, useful for tests and for wiring the
/// pipeline up before a real verifier is plugged in.
pub struct AcceptAllVerifier;

impl JoinSplitVerifier for AcceptAllVerifier {
    fn verify(&self, _proof: &JoinSplitProof) -> bool {
        true
    }
}
