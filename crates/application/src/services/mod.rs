pub mod proof_validator;

pub use proof_validator::{validate_proof, ProofValidator, ValidatedProof};
