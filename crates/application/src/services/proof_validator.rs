use mapserver_dns_domain::config::MapPublicKey;
use mapserver_dns_domain::merkle::{self, MAX_DEPTH};
use mapserver_dns_domain::{MapProof, ValidationError};
use ring::signature::{UnparsedPublicKey, ED25519};
use subtle::ConstantTimeEq;
use tracing::debug;

/// A proof that passed every binding, with its canonical serialization.
///
/// Only [`ProofValidator`] constructs these, so holding one means the bytes
/// are safe to serve.
#[derive(Debug, Clone)]
pub struct ValidatedProof {
    proof: MapProof,
    bytes: Vec<u8>,
}

impl ValidatedProof {
    pub fn proof(&self) -> &MapProof {
        &self.proof
    }

    pub fn canonical_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Checks proofs against one map configuration. Holds no mutable state and
/// performs no I/O.
#[derive(Debug, Clone)]
pub struct ProofValidator {
    tree_id: i64,
    public_key: MapPublicKey,
    tree_nonce: Vec<u8>,
}

impl ProofValidator {
    pub fn new(tree_id: i64, public_key: MapPublicKey, tree_nonce: impl Into<Vec<u8>>) -> Self {
        Self {
            tree_id,
            public_key,
            tree_nonce: tree_nonce.into(),
        }
    }

    pub fn tree_id(&self) -> i64 {
        self.tree_id
    }

    pub fn public_key(&self) -> &MapPublicKey {
        &self.public_key
    }

    pub fn validate(
        &self,
        proof: MapProof,
        expected_domain: &str,
    ) -> Result<ValidatedProof, ValidationError> {
        validate_proof(
            proof,
            self.tree_id,
            &self.public_key,
            &self.tree_nonce,
            expected_domain,
        )
    }
}

/// Verifies the domain, nonce and root bindings of `proof`, in that order,
/// and reports the first one that fails.
pub fn validate_proof(
    proof: MapProof,
    expected_tree_id: i64,
    map_public_key: &MapPublicKey,
    tree_nonce: &[u8],
    expected_domain: &str,
) -> Result<ValidatedProof, ValidationError> {
    check_domain_binding(&proof, expected_domain)?;
    check_nonce_binding(&proof, tree_nonce, expected_domain)?;
    check_root_binding(&proof, expected_tree_id, map_public_key, expected_domain)?;

    let bytes = proof
        .to_canonical_bytes()
        .map_err(|e| ValidationError::Malformed {
            domain: expected_domain.to_string(),
            reason: e.to_string(),
        })?;

    debug!(
        domain = %expected_domain,
        tree_id = expected_tree_id,
        revision = proof.map_root.revision,
        proof_len = bytes.len(),
        "Proof validated"
    );

    Ok(ValidatedProof { proof, bytes })
}

fn check_domain_binding(proof: &MapProof, expected_domain: &str) -> Result<(), ValidationError> {
    if proof.leaf.domain != expected_domain {
        return Err(ValidationError::DomainMismatch {
            expected: expected_domain.to_string(),
            actual: proof.leaf.domain.clone(),
        });
    }
    if proof.domain != expected_domain {
        return Err(ValidationError::DomainMismatch {
            expected: expected_domain.to_string(),
            actual: proof.domain.clone(),
        });
    }
    Ok(())
}

fn check_nonce_binding(
    proof: &MapProof,
    tree_nonce: &[u8],
    expected_domain: &str,
) -> Result<(), ValidationError> {
    if bool::from(proof.leaf.nonce.as_slice().ct_eq(tree_nonce)) {
        Ok(())
    } else {
        Err(ValidationError::NonceMismatch {
            domain: expected_domain.to_string(),
        })
    }
}

fn check_root_binding(
    proof: &MapProof,
    expected_tree_id: i64,
    map_public_key: &MapPublicKey,
    expected_domain: &str,
) -> Result<(), ValidationError> {
    let root_mismatch = |reason: String| ValidationError::RootMismatch {
        domain: expected_domain.to_string(),
        reason,
    };
    let malformed = |reason: String| ValidationError::Malformed {
        domain: expected_domain.to_string(),
        reason,
    };

    if proof.tree_id != expected_tree_id {
        return Err(root_mismatch(format!(
            "proof is for tree {}, expected {}",
            proof.tree_id, expected_tree_id
        )));
    }
    if proof.map_root.tree_id != expected_tree_id {
        return Err(root_mismatch(format!(
            "map root is for tree {}, expected {}",
            proof.map_root.tree_id, expected_tree_id
        )));
    }

    let depth = proof.audit_path.len();
    if depth == 0 || depth > MAX_DEPTH {
        return Err(malformed(format!(
            "audit path depth {} outside 1..={}",
            depth, MAX_DEPTH
        )));
    }

    if proof.leaf_index != merkle::leaf_index(&proof.leaf.domain) {
        return Err(root_mismatch(
            "leaf index is not the map key of the leaf domain".to_string(),
        ));
    }

    let leaf_hash = merkle::leaf_hash(expected_tree_id, &proof.leaf_index, &proof.leaf)
        .map_err(|e| malformed(e.to_string()))?;
    let computed = merkle::compute_root(leaf_hash, &proof.leaf_index, &proof.audit_path)
        .ok_or_else(|| malformed("audit path cannot be folded".to_string()))?;

    if computed != proof.map_root.root_hash {
        return Err(root_mismatch(
            "audit path does not recompute the map root".to_string(),
        ));
    }

    UnparsedPublicKey::new(&ED25519, map_public_key.as_bytes())
        .verify(&proof.map_root.signing_bytes(), &proof.map_root.signature)
        .map_err(|_| root_mismatch("map root signature does not verify".to_string()))?;

    Ok(())
}
