use mapserver_dns_domain::config::MapPublicKey;
use mapserver_dns_domain::merkle::{self, Hash};
use mapserver_dns_domain::{MapLeaf, MapProof, SignedMapRoot};
use ring::signature::{Ed25519KeyPair, KeyPair};

pub const TREE_ID: i64 = 42;
pub const TREE_NONCE: &[u8] = b"infrastructure-test-nonce";

pub fn test_key_pair() -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed_unchecked(&[0x11; 32]).unwrap()
}

pub fn test_public_key() -> MapPublicKey {
    let mut raw = [0u8; 32];
    raw.copy_from_slice(test_key_pair().public_key().as_ref());
    MapPublicKey::from_bytes(raw)
}

/// Proof for `domain` that passes validation against [`TREE_ID`],
/// [`TREE_NONCE`] and [`test_public_key`].
pub fn signed_proof(domain: &str) -> MapProof {
    signed_proof_with_entry(domain, format!("entry:{}", domain).into_bytes())
}

pub fn signed_proof_with_entry(domain: &str, entry: Vec<u8>) -> MapProof {
    let leaf = MapLeaf::new(domain, TREE_NONCE.to_vec(), entry);
    let leaf_index = merkle::leaf_index(domain);
    let audit_path: Vec<Hash> = (0..12u8).map(|level| [level; 32]).collect();

    let leaf_hash = merkle::leaf_hash(TREE_ID, &leaf_index, &leaf).unwrap();
    let root_hash = merkle::compute_root(leaf_hash, &leaf_index, &audit_path).unwrap();

    let mut map_root = SignedMapRoot {
        tree_id: TREE_ID,
        revision: 3,
        timestamp_nanos: 1_650_000_000_000_000_000,
        root_hash,
        signature: Vec::new(),
    };
    map_root.signature = test_key_pair()
        .sign(&map_root.signing_bytes())
        .as_ref()
        .to_vec();

    MapProof {
        domain: domain.to_string(),
        tree_id: TREE_ID,
        leaf_index,
        leaf,
        audit_path,
        map_root,
    }
}
