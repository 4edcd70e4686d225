use mapserver_dns_application::services::ProofValidator;
use mapserver_dns_domain::config::MapPublicKey;
use mapserver_dns_domain::merkle::{self, Hash};
use mapserver_dns_domain::{MapLeaf, MapProof, SignedMapRoot};
use ring::signature::{Ed25519KeyPair, KeyPair};

pub const TREE_ID: i64 = 7261;
pub const TREE_NONCE: &[u8] = b"fixture-tree-nonce";
const KEY_SEED: [u8; 32] = [0x42; 32];
const PATH_DEPTH: usize = 16;

/// Builds map proofs signed by a fixed Ed25519 key, with real audit paths.
pub struct ProofFixture {
    pub tree_id: i64,
    pub nonce: Vec<u8>,
    pub revision: u64,
    key_pair: Ed25519KeyPair,
}

impl ProofFixture {
    pub fn new() -> Self {
        Self::with_seed(KEY_SEED)
    }

    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            tree_id: TREE_ID,
            nonce: TREE_NONCE.to_vec(),
            revision: 12,
            key_pair: Ed25519KeyPair::from_seed_unchecked(&seed).unwrap(),
        }
    }

    pub fn public_key(&self) -> MapPublicKey {
        let mut raw = [0u8; 32];
        raw.copy_from_slice(self.key_pair.public_key().as_ref());
        MapPublicKey::from_bytes(raw)
    }

    pub fn validator(&self) -> ProofValidator {
        ProofValidator::new(self.tree_id, self.public_key(), self.nonce.clone())
    }

    pub fn entry_for(domain: &str) -> Vec<u8> {
        format!("registration-record-for:{}", domain).into_bytes()
    }

    /// Valid proof for `domain` under this fixture's tree, nonce and key.
    pub fn proof_for(&self, domain: &str) -> MapProof {
        let leaf = MapLeaf::new(domain, self.nonce.clone(), Self::entry_for(domain));
        self.proof_with_leaf(domain, leaf)
    }

    /// Proof whose subject is `subject` but whose leaf is `leaf`, correctly
    /// rooted and signed.
    pub fn proof_with_leaf(&self, subject: &str, leaf: MapLeaf) -> MapProof {
        let leaf_index = merkle::leaf_index(&leaf.domain);
        let audit_path: Vec<Hash> = (0..PATH_DEPTH)
            .map(|level| merkle::node_hash(&[level as u8; 32], &leaf_index))
            .collect();

        let mut proof = MapProof {
            domain: subject.to_string(),
            tree_id: self.tree_id,
            leaf_index,
            leaf,
            audit_path,
            map_root: SignedMapRoot {
                tree_id: self.tree_id,
                revision: self.revision,
                timestamp_nanos: 1_700_000_000_000_000_000,
                root_hash: [0u8; 32],
                signature: Vec::new(),
            },
        };
        self.reroot(&mut proof);
        proof
    }

    /// Recomputes the root from the proof's own leaf and path and re-signs it.
    pub fn reroot(&self, proof: &mut MapProof) {
        let leaf_hash = merkle::leaf_hash(proof.tree_id, &proof.leaf_index, &proof.leaf).unwrap();
        proof.map_root.root_hash =
            merkle::compute_root(leaf_hash, &proof.leaf_index, &proof.audit_path).unwrap();
        self.resign(proof);
    }

    pub fn resign(&self, proof: &mut MapProof) {
        proof.map_root.signature = self
            .key_pair
            .sign(&proof.map_root.signing_bytes())
            .as_ref()
            .to_vec();
    }
}

impl Default for ProofFixture {
    fn default() -> Self {
        Self::new()
    }
}
