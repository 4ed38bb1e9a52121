//! Big-endian conversion between byte sequences, integers, and 128-bit
//! identifiers. Readers are bounds-checked; a short buffer is a malformed
//! frame, not a panic.

use uuid::Uuid;

use crate::{AppError, AppResult};

fn short(expected: usize, got: usize) -> AppError {
    AppError::MalformedFrame(format!(
        "{} bytes required, {} available",
        expected, got
    ))
}

pub fn read_u16(buf: &[u8]) -> AppResult<u16> {
    let bytes = buf.get(..2).ok_or_else(|| short(2, buf.len()))?;
    Ok(u16::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn read_u32(buf: &[u8]) -> AppResult<u32> {
    let bytes = buf.get(..4).ok_or_else(|| short(4, buf.len()))?;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn read_u64(buf: &[u8]) -> AppResult<u64> {
    let bytes = buf.get(..8).ok_or_else(|| short(8, buf.len()))?;
    Ok(u64::from_be_bytes(bytes.try_into().unwrap()))
}

pub fn read_i64(buf: &[u8]) -> AppResult<i64> {
    let bytes = buf.get(..8).ok_or_else(|| short(8, buf.len()))?;
    Ok(i64::from_be_bytes(bytes.try_into().unwrap()))
}

/// Reads a 128-bit identifier from 16 big-endian bytes.
pub fn read_uuid(buf: &[u8]) -> AppResult<Uuid> {
    let bytes = buf.get(..16).ok_or_else(|| short(16, buf.len()))?;
    Ok(Uuid::from_slice(bytes).expect("length checked"))
}

pub fn uuid_to_bytes(id: &Uuid) -> [u8; 16] {
    *id.as_bytes()
}
