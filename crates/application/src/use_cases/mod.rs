pub mod serve_proof;

// Re-export use cases
pub use serve_proof::{ProofAnswer, RequestStage, ServeProofUseCase};
