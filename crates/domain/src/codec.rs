//! Length-prefixed big-endian primitives shared by the proof encoding and the
//! map-server protocol.

use crate::errors::CodecError;
use bytes::{Buf, BufMut};

pub fn put_u16_prefixed<B: BufMut>(
    buf: &mut B,
    field: &'static str,
    data: &[u8],
) -> Result<(), CodecError> {
    let len = u16::try_from(data.len()).map_err(|_| CodecError::FieldTooLong {
        field,
        len: data.len(),
    })?;
    buf.put_u16(len);
    buf.put_slice(data);
    Ok(())
}

pub fn put_u32_prefixed<B: BufMut>(
    buf: &mut B,
    field: &'static str,
    data: &[u8],
) -> Result<(), CodecError> {
    let len = u32::try_from(data.len()).map_err(|_| CodecError::FieldTooLong {
        field,
        len: data.len(),
    })?;
    buf.put_u32(len);
    buf.put_slice(data);
    Ok(())
}

fn ensure(buf: &&[u8], needed: usize, field: &'static str) -> Result<(), CodecError> {
    if buf.remaining() < needed {
        return Err(CodecError::Truncated(field));
    }
    Ok(())
}

pub fn take_u8(buf: &mut &[u8], field: &'static str) -> Result<u8, CodecError> {
    ensure(buf, 1, field)?;
    Ok(buf.get_u8())
}

pub fn take_u16(buf: &mut &[u8], field: &'static str) -> Result<u16, CodecError> {
    ensure(buf, 2, field)?;
    Ok(buf.get_u16())
}

pub fn take_u32(buf: &mut &[u8], field: &'static str) -> Result<u32, CodecError> {
    ensure(buf, 4, field)?;
    Ok(buf.get_u32())
}

pub fn take_u64(buf: &mut &[u8], field: &'static str) -> Result<u64, CodecError> {
    ensure(buf, 8, field)?;
    Ok(buf.get_u64())
}

pub fn take_i64(buf: &mut &[u8], field: &'static str) -> Result<i64, CodecError> {
    ensure(buf, 8, field)?;
    Ok(buf.get_i64())
}

pub fn take_array<const N: usize>(
    buf: &mut &[u8],
    field: &'static str,
) -> Result<[u8; N], CodecError> {
    ensure(buf, N, field)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

pub fn take_bytes(buf: &mut &[u8], len: usize, field: &'static str) -> Result<Vec<u8>, CodecError> {
    ensure(buf, len, field)?;
    let out = buf[..len].to_vec();
    buf.advance(len);
    Ok(out)
}

pub fn take_u16_prefixed(buf: &mut &[u8], field: &'static str) -> Result<Vec<u8>, CodecError> {
    let len = take_u16(buf, field)? as usize;
    take_bytes(buf, len, field)
}

pub fn take_u32_prefixed(buf: &mut &[u8], field: &'static str) -> Result<Vec<u8>, CodecError> {
    let len = take_u32(buf, field)? as usize;
    take_bytes(buf, len, field)
}

pub fn take_string(buf: &mut &[u8], field: &'static str) -> Result<String, CodecError> {
    let raw = take_u16_prefixed(buf, field)?;
    String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8(field))
}
