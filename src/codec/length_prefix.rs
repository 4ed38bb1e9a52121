//! BER-style length octets.
//!
//! A payload length of 127 or less is encoded as a single octet holding the
//! length itself (top bit clear). Longer payloads get a first octet with the
//! top bit set whose low 7 bits count the 1..=4 following big-endian length
//! octets, supporting lengths up to `i32::MAX`.

use crate::{AppError, AppResult};

/// Largest payload length the prefix can represent.
pub const MAX_PAYLOAD_LEN: usize = 0x7fff_ffff;

/// Largest number of octets a prefix occupies.
pub const MAX_PREFIX_LEN: usize = 5;

/// Number of octets the prefix for a payload of `payload_len` occupies.
pub fn encoded_len(payload_len: usize) -> usize {
    if payload_len <= 127 {
        1
    } else if payload_len <= 0xff {
        2
    } else if payload_len <= 0xffff {
        3
    } else if payload_len <= 0x00ff_ffff {
        4
    } else {
        5
    }
}

/// Writes the length prefix for the payload occupying `buf[start..]` into the
/// slack that precedes `start`, returning the offset at which the finished
/// frame begins.
///
/// The caller must have reserved at least `encoded_len` octets of slack in
/// front of `start`. Payloads above [`MAX_PAYLOAD_LEN`] fail with
/// `EncodingOverflow` before any bytes are queued.
pub fn write_prefix(buf: &mut [u8], start: usize) -> AppResult<usize> {
    let payload_len = buf.len() - start;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(AppError::EncodingOverflow(payload_len));
    }
    let prefix_len = encoded_len(payload_len);
    if start < prefix_len {
        return Err(AppError::IllegalState(format!(
            "{} octets of header slack left for a {}-octet length prefix",
            start, prefix_len
        )));
    }

    let offset = start - prefix_len;
    if payload_len <= 127 {
        buf[offset] = payload_len as u8;
    } else {
        buf[offset] = 0x80 | (prefix_len as u8 - 1);
        let ext = &mut buf[offset + 1..start];
        let be = (payload_len as u32).to_be_bytes();
        ext.copy_from_slice(&be[4 - ext.len()..]);
    }
    Ok(offset)
}

/// Decodes 1..=4 big-endian extension octets into a payload length.
///
/// A 4-octet extension with its top bit set would exceed `i32::MAX` and is
/// malformed, as is any other octet count.
pub fn decode_extended(octets: &[u8]) -> AppResult<usize> {
    match octets.len() {
        1 => Ok(octets[0] as usize),
        2 => Ok(u16::from_be_bytes([octets[0], octets[1]]) as usize),
        3 => Ok(u32::from_be_bytes([0, octets[0], octets[1], octets[2]]) as usize),
        4 => {
            if octets[0] >= 0x80 {
                return Err(AppError::MalformedFrame(
                    "top bit set in a 4-octet extended length".to_string(),
                ));
            }
            Ok(u32::from_be_bytes([octets[0], octets[1], octets[2], octets[3]]) as usize)
        }
        n => Err(AppError::MalformedFrame(format!(
            "illegal extension octet count {}",
            n
        ))),
    }
}
