//! Bitcoin CompactSize (VarInt) encoding for consensus-critical serialization.
//! Used by the sighash message (script lengths), tap leaf hashing and the transaction codec.
//!
//! Readers take `&mut &[u8]` and advance the slice past what they consumed.

use alloc::vec::Vec;

use byteorder::ByteOrder;
use byteorder::LittleEndian;

use crate::error::TxError;

/// Encodes `n` as Bitcoin CompactSize and appends to `buf`.
/// 0–252: 1 byte; 253–0xFFFF: 0xFD + 2B LE; 0x10000–0xFFFFFFFF: 0xFE + 4B LE; else 0xFF + 8B LE.
#[inline]
pub fn write_compact_size(buf: &mut Vec<u8>, n: u64) {
    if n < 253 {
        buf.push(n as u8);
    } else if n < 0x1_0000 {
        buf.push(0xfd);
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, n as u16);
        buf.extend_from_slice(&b);
    } else if n < 0x1_0000_0000 {
        buf.push(0xfe);
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, n as u32);
        buf.extend_from_slice(&b);
    } else {
        buf.push(0xff);
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, n);
        buf.extend_from_slice(&b);
    }
}

/// Length-prefixed byte string (CompactSize length + bytes).
#[inline]
pub fn write_var_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_compact_size(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Number of bytes `write_compact_size` emits for `n`.
pub const fn compact_size_len(n: u64) -> usize {
    if n < 253 {
        1
    } else if n < 0x1_0000 {
        3
    } else if n < 0x1_0000_0000 {
        5
    } else {
        9
    }
}

/// Decodes a CompactSize from the front of `data`, rejecting non-minimal encodings.
pub fn read_compact_size(data: &mut &[u8]) -> Result<u64, TxError> {
    let first = *data.first().ok_or(TxError::IncompleteData)?;
    let (value, width, min) = match first {
        0xfd => (LittleEndian::read_u16(&take(data, 3)?[1..]) as u64, 3, 253),
        0xfe => (LittleEndian::read_u32(&take(data, 5)?[1..]) as u64, 5, 0x1_0000),
        0xff => (LittleEndian::read_u64(&take(data, 9)?[1..]), 9, 0x1_0000_0000),
        b => (b as u64, 1, 0),
    };
    if value < min {
        return Err(TxError::NonCanonicalCompactSize);
    }
    *data = &data[width..];
    Ok(value)
}

/// Reads a length-prefixed byte string.
pub fn read_var_bytes(data: &mut &[u8]) -> Result<Vec<u8>, TxError> {
    let len = read_compact_size(data)?;
    if len > data.len() as u64 {
        return Err(TxError::IncompleteData);
    }
    let len = len as usize;
    let bytes = data[..len].to_vec();
    *data = &data[len..];
    Ok(bytes)
}

pub fn read_u32(data: &mut &[u8]) -> Result<u32, TxError> {
    let n = LittleEndian::read_u32(take(data, 4)?);
    *data = &data[4..];
    Ok(n)
}

pub fn read_u64(data: &mut &[u8]) -> Result<u64, TxError> {
    let n = LittleEndian::read_u64(take(data, 8)?);
    *data = &data[8..];
    Ok(n)
}

/// Peeks `n` bytes without advancing.
fn take<'a>(data: &&'a [u8], n: usize) -> Result<&'a [u8], TxError> {
    data.get(..n).ok_or(TxError::IncompleteData)
}
