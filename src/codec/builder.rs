use bytes::Bytes;

use super::length_prefix;
use crate::{AppError, AppResult};

/// Leading slack an inner structured encoder must reserve so the length
/// prefix and the component/message-type header can be written in place,
/// without copying the body.
pub const HEADER_SLACK: usize = 7;

/// A fully framed outbound message: immutable frame bytes plus a cursor
/// tracking how much of it has already been flushed to the socket.
///
/// A `Message` is owned exclusively by the channel sending it until fully
/// flushed, then dropped.
#[derive(Debug)]
pub struct Message {
    buffer: Bytes,
    cursor: usize,
}

impl Message {
    fn from_parts(buf: Vec<u8>, start: usize) -> Message {
        Message {
            buffer: Bytes::from(buf).slice(start..),
            cursor: 0,
        }
    }

    /// Frame bytes not yet written to the socket.
    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.cursor..]
    }

    /// Advances the write cursor after a (possibly partial) write. Advancing
    /// past the end of the frame pins the cursor at the end.
    pub fn advance(&mut self, written: usize) {
        self.cursor = self
            .cursor
            .saturating_add(written)
            .min(self.buffer.len());
    }

    pub fn is_flushed(&self) -> bool {
        self.cursor == self.buffer.len()
    }

    /// Total frame length, prefix included.
    pub fn frame_len(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }
}

/// Body buffer produced by an inner structured encoder, with [`HEADER_SLACK`]
/// octets reserved in front of the body for the prefix and header.
#[derive(Debug)]
pub struct HeadedBuffer {
    buf: Vec<u8>,
    offset: usize,
}

impl HeadedBuffer {
    pub fn new() -> HeadedBuffer {
        HeadedBuffer {
            buf: vec![0u8; HEADER_SLACK],
            offset: HEADER_SLACK,
        }
    }

    pub fn from_body(body: &[u8]) -> HeadedBuffer {
        let mut headed = HeadedBuffer::new();
        headed.put(body);
        headed
    }

    /// Appends body bytes.
    pub fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn body_len(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn into_parts(self) -> (Vec<u8>, usize) {
        (self.buf, self.offset)
    }
}

impl Default for HeadedBuffer {
    fn default() -> Self {
        HeadedBuffer::new()
    }
}

/// Builders for every frame shape on the wire.
pub struct MsgBuilder;

impl MsgBuilder {
    /// Wraps a raw payload with nothing but a length prefix.
    pub fn prefixed(payload: &[u8]) -> AppResult<Message> {
        let mut buf = vec![0u8; length_prefix::MAX_PREFIX_LEN + payload.len()];
        buf[length_prefix::MAX_PREFIX_LEN..].copy_from_slice(payload);
        let start = length_prefix::write_prefix(&mut buf, length_prefix::MAX_PREFIX_LEN)?;
        Ok(Message::from_parts(buf, start))
    }

    /// `[componentId][messageType]` header in front of an encoded body.
    pub fn headed(component_id: u8, message_type: u8, headed: HeadedBuffer) -> AppResult<Message> {
        let (mut buf, offset) = headed.into_parts();
        Self::check_slack(offset)?;
        buf[offset - 2] = component_id;
        buf[offset - 1] = message_type;
        let start = length_prefix::write_prefix(&mut buf, offset - 2)?;
        Ok(Message::from_parts(buf, start))
    }

    /// `[messageType]` header in front of an encoded body.
    pub fn typed(message_type: u8, headed: HeadedBuffer) -> AppResult<Message> {
        let (mut buf, offset) = headed.into_parts();
        Self::check_slack(offset)?;
        buf[offset - 1] = message_type;
        let start = length_prefix::write_prefix(&mut buf, offset - 1)?;
        Ok(Message::from_parts(buf, start))
    }

    /// Bare 2-byte control frame.
    pub fn control2(component_id: u8, message_type: u8) -> Message {
        Message::from_parts(vec![2, component_id, message_type], 0)
    }

    /// Bare 1-byte control frame.
    pub fn control1(message_type: u8) -> Message {
        Message::from_parts(vec![1, message_type], 0)
    }

    /// Error frame with a component id: `[componentId][messageType][code:u16]`.
    pub fn error2(component_id: u8, message_type: u8, error_code: u16) -> Message {
        let [hi, lo] = error_code.to_be_bytes();
        Message::from_parts(vec![4, component_id, message_type, hi, lo], 0)
    }

    /// Error frame without a component id: `[messageType][code:u16]`.
    pub fn error1(message_type: u8, error_code: u16) -> Message {
        let [hi, lo] = error_code.to_be_bytes();
        Message::from_parts(vec![3, message_type, hi, lo], 0)
    }

    fn check_slack(offset: usize) -> AppResult<()> {
        if offset < HEADER_SLACK {
            return Err(AppError::IllegalState(format!(
                "inner encoder reserved {} octets of header slack, {} required",
                offset, HEADER_SLACK
            )));
        }
        Ok(())
    }
}
