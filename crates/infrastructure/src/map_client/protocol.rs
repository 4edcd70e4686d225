//! Map server wire protocol.
//!
//! One request and one response per TCP connection, each carried in a frame
//! of a big-endian `u32` length followed by the payload.

use bytes::BufMut;
use mapserver_dns_domain::codec::{
    put_u16_prefixed, put_u32_prefixed, take_i64, take_string, take_u16, take_u16_prefixed,
    take_u32_prefixed, take_u8,
};
use mapserver_dns_domain::{CodecError, MapProof, RetrievalError};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const PROTOCOL_VERSION: u8 = 1;
pub const KIND_GET_PROOF_FOR_DOMAINS: u8 = 1;

const STATUS_OK: u8 = 0;
const STATUS_ERROR: u8 = 1;
const FRAME_HEADER_LEN: usize = 4;
/// Smallest encoding of one proof entry: its `u32` length prefix.
const MIN_PROOF_ENTRY_LEN: usize = 4;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetProofForDomains {
    pub tree_id: i64,
    pub expected_map_public_key: Vec<u8>,
    pub domains: Vec<String>,
}

impl GetProofForDomains {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let count = u16::try_from(self.domains.len()).map_err(|_| CodecError::FieldTooLong {
            field: "domains",
            len: self.domains.len(),
        })?;

        let mut buf = Vec::with_capacity(
            16 + self.expected_map_public_key.len()
                + self.domains.iter().map(|d| d.len() + 2).sum::<usize>(),
        );
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u8(KIND_GET_PROOF_FOR_DOMAINS);
        buf.put_i64(self.tree_id);
        put_u16_prefixed(&mut buf, "public_key", &self.expected_map_public_key)?;
        buf.put_u16(count);
        for domain in &self.domains {
            put_u16_prefixed(&mut buf, "domain", domain.as_bytes())?;
        }
        Ok(buf)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, RetrievalError> {
        let mut cursor = payload;
        check_version(take_u8(&mut cursor, "version")?)?;

        let kind = take_u8(&mut cursor, "kind")?;
        if kind != KIND_GET_PROOF_FOR_DOMAINS {
            return Err(RetrievalError::Protocol(format!(
                "unknown request kind {}",
                kind
            )));
        }

        let tree_id = take_i64(&mut cursor, "tree_id")?;
        let expected_map_public_key = take_u16_prefixed(&mut cursor, "public_key")?;
        let count = take_u16(&mut cursor, "domains")?;
        let domains = (0..count)
            .map(|_| take_string(&mut cursor, "domain"))
            .collect::<Result<Vec<_>, _>>()?;
        ensure_consumed(cursor)?;

        Ok(Self {
            tree_id,
            expected_map_public_key,
            domains,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapResponse {
    Proofs(Vec<MapProof>),
    Error(String),
}

impl MapResponse {
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        buf.put_u8(PROTOCOL_VERSION);
        match self {
            Self::Proofs(proofs) => {
                let count = u16::try_from(proofs.len()).map_err(|_| CodecError::FieldTooLong {
                    field: "proofs",
                    len: proofs.len(),
                })?;
                buf.put_u8(STATUS_OK);
                buf.put_u16(count);
                for proof in proofs {
                    put_u32_prefixed(&mut buf, "proof", &proof.to_canonical_bytes()?)?;
                }
            }
            Self::Error(message) => {
                buf.put_u8(STATUS_ERROR);
                put_u16_prefixed(&mut buf, "error", message.as_bytes())?;
            }
        }
        Ok(buf)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, RetrievalError> {
        let mut cursor = payload;
        check_version(take_u8(&mut cursor, "version")?)?;

        let response = match take_u8(&mut cursor, "status")? {
            STATUS_OK => {
                let count = take_u16(&mut cursor, "proofs")?;
                let capacity = usize::from(count).min(cursor.len() / MIN_PROOF_ENTRY_LEN);
                let mut proofs = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let bytes = take_u32_prefixed(&mut cursor, "proof")?;
                    proofs.push(MapProof::from_canonical_bytes(&bytes)?);
                }
                Self::Proofs(proofs)
            }
            STATUS_ERROR => Self::Error(take_string(&mut cursor, "error")?),
            other => {
                return Err(RetrievalError::Protocol(format!(
                    "unknown response status {}",
                    other
                )))
            }
        };
        ensure_consumed(cursor)?;
        Ok(response)
    }
}

fn check_version(version: u8) -> Result<(), RetrievalError> {
    if version != PROTOCOL_VERSION {
        return Err(RetrievalError::Protocol(format!(
            "unsupported protocol version {}",
            version
        )));
    }
    Ok(())
}

fn ensure_consumed(rest: &[u8]) -> Result<(), RetrievalError> {
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()).into());
    }
    Ok(())
}

pub async fn write_frame<S>(stream: &mut S, payload: &[u8]) -> Result<(), FrameError>
where
    S: AsyncWriteExt + Unpin,
{
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads one frame, rejecting it before allocation when the announced
/// length exceeds `max_size`.
pub async fn read_frame<S>(stream: &mut S, max_size: usize) -> Result<Vec<u8>, FrameError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; FRAME_HEADER_LEN];
    stream.read_exact(&mut len_buf).await?;

    let frame_len = u32::from_be_bytes(len_buf) as usize;
    if frame_len > max_size {
        return Err(FrameError::TooLarge {
            size: frame_len,
            max: max_size,
        });
    }

    let mut payload = vec![0u8; frame_len];
    stream.read_exact(&mut payload).await?;
    Ok(payload)
}
