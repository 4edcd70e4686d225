//! Map inclusion proofs and their canonical binary form.
//!
//! The canonical form is what gets served in TXT records once a proof has
//! been validated, so it must be byte-stable: encoding a decoded proof
//! yields the exact input bytes.

use crate::codec::{
    put_u16_prefixed, put_u32_prefixed, take_array, take_i64, take_string, take_u16,
    take_u16_prefixed, take_u32_prefixed, take_u64, take_u8,
};
use crate::errors::CodecError;
use crate::merkle::{Hash, HASH_LEN, MAX_DEPTH};
use bytes::BufMut;

pub const PROOF_ENCODING_VERSION: u8 = 1;

/// Domain separator for the message the map server signs over a root.
pub const ROOT_SIGNING_CONTEXT: &[u8] = b"mapserver-dns/root/v1";

/// Value committed at one map position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLeaf {
    pub domain: String,
    pub nonce: Vec<u8>,
    /// Registration payload stored for the domain. Opaque here.
    pub entry: Vec<u8>,
}

impl MapLeaf {
    pub fn new(domain: impl Into<String>, nonce: impl Into<Vec<u8>>, entry: impl Into<Vec<u8>>) -> Self {
        Self {
            domain: domain.into(),
            nonce: nonce.into(),
            entry: entry.into(),
        }
    }

    /// Bytes hashed into the leaf commitment.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(8 + self.domain.len() + self.nonce.len() + self.entry.len());
        put_u16_prefixed(&mut buf, "leaf.domain", self.domain.as_bytes())?;
        put_u16_prefixed(&mut buf, "leaf.nonce", &self.nonce)?;
        put_u32_prefixed(&mut buf, "leaf.entry", &self.entry)?;
        Ok(buf)
    }
}

/// Map root as attested by the map server's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMapRoot {
    pub tree_id: i64,
    pub revision: u64,
    pub timestamp_nanos: u64,
    pub root_hash: Hash,
    pub signature: Vec<u8>,
}

impl SignedMapRoot {
    /// Message covered by `signature`.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ROOT_SIGNING_CONTEXT.len() + 24 + HASH_LEN);
        buf.put_slice(ROOT_SIGNING_CONTEXT);
        buf.put_i64(self.tree_id);
        buf.put_u64(self.revision);
        buf.put_u64(self.timestamp_nanos);
        buf.put_slice(&self.root_hash);
        buf
    }
}

/// Inclusion proof for one domain, as returned by the map server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapProof {
    pub domain: String,
    pub tree_id: i64,
    /// Position of the leaf; its bits select left/right at each level.
    pub leaf_index: Hash,
    pub leaf: MapLeaf,
    /// Sibling hashes ordered from the leaf level up to just below the root.
    pub audit_path: Vec<Hash>,
    pub map_root: SignedMapRoot,
}

impl MapProof {
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, CodecError> {
        if self.audit_path.len() > MAX_DEPTH {
            return Err(CodecError::PathTooLong(self.audit_path.len()));
        }

        let mut buf = Vec::with_capacity(self.encoded_len_hint());
        buf.put_u8(PROOF_ENCODING_VERSION);
        buf.put_i64(self.tree_id);
        put_u16_prefixed(&mut buf, "domain", self.domain.as_bytes())?;
        buf.put_slice(&self.leaf_index);
        buf.put_slice(&self.leaf.canonical_bytes()?);
        buf.put_u16(self.audit_path.len() as u16);
        for sibling in &self.audit_path {
            buf.put_slice(sibling);
        }
        buf.put_i64(self.map_root.tree_id);
        buf.put_u64(self.map_root.revision);
        buf.put_u64(self.map_root.timestamp_nanos);
        buf.put_slice(&self.map_root.root_hash);
        put_u16_prefixed(&mut buf, "root.signature", &self.map_root.signature)?;
        Ok(buf)
    }

    /// Decodes exactly one proof; trailing bytes are an error.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = bytes;

        let version = take_u8(&mut cursor, "version")?;
        if version != PROOF_ENCODING_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        let tree_id = take_i64(&mut cursor, "tree_id")?;
        let domain = take_string(&mut cursor, "domain")?;
        let leaf_index = take_array::<HASH_LEN>(&mut cursor, "leaf_index")?;

        let leaf = MapLeaf {
            domain: take_string(&mut cursor, "leaf.domain")?,
            nonce: take_u16_prefixed(&mut cursor, "leaf.nonce")?,
            entry: take_u32_prefixed(&mut cursor, "leaf.entry")?,
        };

        let depth = take_u16(&mut cursor, "audit_path")? as usize;
        if depth > MAX_DEPTH {
            return Err(CodecError::PathTooLong(depth));
        }
        let mut audit_path = Vec::with_capacity(depth);
        for _ in 0..depth {
            audit_path.push(take_array::<HASH_LEN>(&mut cursor, "audit_path")?);
        }

        let map_root = SignedMapRoot {
            tree_id: take_i64(&mut cursor, "root.tree_id")?,
            revision: take_u64(&mut cursor, "root.revision")?,
            timestamp_nanos: take_u64(&mut cursor, "root.timestamp")?,
            root_hash: take_array::<HASH_LEN>(&mut cursor, "root.root_hash")?,
            signature: take_u16_prefixed(&mut cursor, "root.signature")?,
        };

        if !cursor.is_empty() {
            return Err(CodecError::TrailingBytes(cursor.len()));
        }

        Ok(Self {
            domain,
            tree_id,
            leaf_index,
            leaf,
            audit_path,
            map_root,
        })
    }

    fn encoded_len_hint(&self) -> usize {
        64 + self.domain.len()
            + self.leaf.domain.len()
            + self.leaf.nonce.len()
            + self.leaf.entry.len()
            + self.audit_path.len() * HASH_LEN
            + 3 * 8
            + HASH_LEN
            + self.map_root.signature.len()
    }
}
