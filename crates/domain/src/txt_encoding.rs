//! Packs arbitrary bytes into TXT character-strings.
//!
//! Every byte is written as a `\DDD` decimal escape and a new string starts
//! after each 255 input bytes, so each string unescapes to at most 255 bytes,
//! the character-string limit on the wire.

use crate::errors::EncodingError;

/// Raw bytes carried by one character-string.
pub const TXT_CHUNK_SIZE: usize = 255;

const ESCAPED_BYTE_LEN: usize = 4;

pub fn encode(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(TXT_CHUNK_SIZE)
        .map(|chunk| {
            let mut out = String::with_capacity(chunk.len() * ESCAPED_BYTE_LEN);
            for &b in chunk {
                out.push('\\');
                out.push(char::from(b'0' + b / 100));
                out.push(char::from(b'0' + b / 10 % 10));
                out.push(char::from(b'0' + b % 10));
            }
            out
        })
        .collect()
}

/// Unescapes one character-string produced by [`encode`].
pub fn decode_string(index: usize, s: &str) -> Result<Vec<u8>, EncodingError> {
    let raw = s.as_bytes();
    if raw.len() % ESCAPED_BYTE_LEN != 0 {
        return Err(EncodingError::InvalidEscape {
            index,
            reason: format!("length {} is not a multiple of {}", raw.len(), ESCAPED_BYTE_LEN),
        });
    }

    let mut out = Vec::with_capacity(raw.len() / ESCAPED_BYTE_LEN);
    for (pos, escape) in raw.chunks(ESCAPED_BYTE_LEN).enumerate() {
        if escape[0] != b'\\' || !escape[1..].iter().all(u8::is_ascii_digit) {
            return Err(EncodingError::InvalidEscape {
                index,
                reason: format!("byte {} is not a \\DDD escape", pos),
            });
        }
        let value = escape[1..]
            .iter()
            .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
        let byte = u8::try_from(value).map_err(|_| EncodingError::InvalidEscape {
            index,
            reason: format!("escape value {} out of range", value),
        })?;
        out.push(byte);
    }
    Ok(out)
}

/// Concatenates the decoded form of every string, in order.
pub fn decode<S: AsRef<str>>(strings: &[S]) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::new();
    for (index, s) in strings.iter().enumerate() {
        out.extend(decode_string(index, s.as_ref())?);
    }
    Ok(out)
}
