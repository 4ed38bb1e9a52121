use bytes::{Bytes, BytesMut};

use super::length_prefix;
use crate::{AppError, AppResult};

/// Channel-configurable bounds on decoded payload lengths. Any decoded
/// length outside the range is a format error, regardless of which prefix
/// form produced it.
#[derive(Debug, Clone, Copy)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl Default for LengthBounds {
    fn default() -> Self {
        LengthBounds { min: 2, max: 127 }
    }
}

#[derive(Debug)]
enum DecodeState {
    AwaitingOrigin,
    AwaitingExtendedLength,
    AwaitingPayload,
}

/// Incremental framing state machine over an arbitrarily chunked byte
/// stream.
///
/// Feed it each received chunk; every message the chunk completes is handed
/// to the delivery callback in stream arrival order, before `feed` returns.
/// All partial state (length octets, a half-filled payload) survives across
/// chunk boundaries.
#[derive(Debug)]
pub struct FrameDecoder {
    bounds: LengthBounds,
    state: DecodeState,
    len_octets: [u8; 4],
    len_expected: usize,
    len_received: usize,
    payload: BytesMut,
    payload_len: usize,
}

impl FrameDecoder {
    pub fn new(bounds: LengthBounds) -> FrameDecoder {
        FrameDecoder {
            bounds,
            state: DecodeState::AwaitingOrigin,
            len_octets: [0; 4],
            len_expected: 0,
            len_received: 0,
            payload: BytesMut::new(),
            payload_len: 0,
        }
    }

    /// Consumes one received chunk, delivering each completed message as the
    /// chunk is walked. A single chunk may complete zero, one, or many
    /// messages; messages completed before a format violation in the same
    /// chunk are still delivered. Once an error is returned the decoder
    /// state is undefined and the channel must be closed.
    pub fn feed(&mut self, mut chunk: &[u8], mut deliver: impl FnMut(Bytes)) -> AppResult<()> {
        while !chunk.is_empty() {
            match self.state {
                DecodeState::AwaitingOrigin => {
                    let first = chunk[0];
                    chunk = &chunk[1..];
                    if first <= 127 {
                        self.begin_payload(first as usize, &mut deliver)?;
                    } else {
                        let count = (first & 0x7f) as usize;
                        if !(1..=4).contains(&count) {
                            return Err(AppError::MalformedFrame(format!(
                                "illegal extension octet count {}",
                                count
                            )));
                        }
                        self.len_expected = count;
                        self.len_received = 0;
                        self.state = DecodeState::AwaitingExtendedLength;
                    }
                }
                DecodeState::AwaitingExtendedLength => {
                    let take = (self.len_expected - self.len_received).min(chunk.len());
                    self.len_octets[self.len_received..self.len_received + take]
                        .copy_from_slice(&chunk[..take]);
                    self.len_received += take;
                    chunk = &chunk[take..];

                    if self.len_received == self.len_expected {
                        let length =
                            length_prefix::decode_extended(&self.len_octets[..self.len_expected])?;
                        self.begin_payload(length, &mut deliver)?;
                    }
                }
                DecodeState::AwaitingPayload => {
                    let take = (self.payload_len - self.payload.len()).min(chunk.len());
                    self.payload.extend_from_slice(&chunk[..take]);
                    chunk = &chunk[take..];

                    if self.payload.len() == self.payload_len {
                        deliver(self.payload.split().freeze());
                        self.state = DecodeState::AwaitingOrigin;
                    }
                }
            }
        }

        Ok(())
    }

    fn begin_payload(
        &mut self,
        length: usize,
        deliver: &mut impl FnMut(Bytes),
    ) -> AppResult<()> {
        if length < self.bounds.min || length > self.bounds.max {
            return Err(AppError::MalformedFrame(format!(
                "payload length {} outside bounds {}..={}",
                length, self.bounds.min, self.bounds.max
            )));
        }
        if length == 0 {
            // reachable only with a configured minimum of zero
            deliver(Bytes::new());
            self.state = DecodeState::AwaitingOrigin;
            return Ok(());
        }
        self.payload_len = length;
        self.payload.reserve(length);
        self.state = DecodeState::AwaitingPayload;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgBuilder;

    fn wide_bounds() -> LengthBounds {
        LengthBounds {
            min: 1,
            max: length_prefix::MAX_PAYLOAD_LEN,
        }
    }

    fn stream_of(payloads: &[&[u8]]) -> Vec<u8> {
        let mut stream = Vec::new();
        for payload in payloads {
            let message = MsgBuilder::prefixed(payload).unwrap();
            stream.extend_from_slice(message.remaining());
        }
        stream
    }

    #[test]
    fn test_single_chunk_many_messages() {
        let stream = stream_of(&[b"alpha", b"bravo", b"charlie"]);
        let mut decoder = FrameDecoder::new(wide_bounds());
        let mut messages = Vec::new();
        decoder.feed(&stream, |m| messages.push(m)).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(&messages[0][..], b"alpha");
        assert_eq!(&messages[1][..], b"bravo");
        assert_eq!(&messages[2][..], b"charlie");
    }

    #[test]
    fn test_chunk_boundary_independence() {
        // extended-length message in the middle so the split walks through
        // every state of the machine
        let long = vec![0x5au8; 300];
        let payloads: Vec<&[u8]> = vec![b"ab", &long, b"tail-message"];
        let stream = stream_of(&payloads);

        for split in 0..=stream.len() {
            let mut decoder = FrameDecoder::new(wide_bounds());
            let mut messages = Vec::new();
            decoder.feed(&stream[..split], |m| messages.push(m)).unwrap();
            decoder.feed(&stream[split..], |m| messages.push(m)).unwrap();

            assert_eq!(messages.len(), 3, "split at {}", split);
            for (message, payload) in messages.iter().zip(payloads.iter()) {
                assert_eq!(&message[..], *payload, "split at {}", split);
            }
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let stream = stream_of(&[b"one", b"two"]);
        let mut decoder = FrameDecoder::new(wide_bounds());
        let mut messages = Vec::new();
        for byte in &stream {
            decoder
                .feed(std::slice::from_ref(byte), |m| messages.push(m))
                .unwrap();
        }
        assert_eq!(messages.len(), 2);
        assert_eq!(&messages[0][..], b"one");
        assert_eq!(&messages[1][..], b"two");
    }

    #[test]
    fn test_default_bounds_reject_short_and_long() {
        let mut decoder = FrameDecoder::new(LengthBounds::default());
        // direct length 1 is below the default minimum of 2
        let err = decoder.feed(&[0x01, 0xff], |_| {}).unwrap_err();
        assert!(matches!(err, AppError::MalformedFrame(_)));

        let mut decoder = FrameDecoder::new(LengthBounds::default());
        // extended length 128 is above the default maximum of 127
        let err = decoder.feed(&[0x81, 0x80], |_| {}).unwrap_err();
        assert!(matches!(err, AppError::MalformedFrame(_)));
    }

    #[test]
    fn test_illegal_extension_count() {
        let mut decoder = FrameDecoder::new(wide_bounds());
        // top bit set with a low-7-bit count of 5
        let err = decoder.feed(&[0x85], |_| {}).unwrap_err();
        assert!(matches!(err, AppError::MalformedFrame(_)));
    }

    #[test]
    fn test_four_octet_top_bit_rejected() {
        let mut decoder = FrameDecoder::new(wide_bounds());
        let err = decoder.feed(&[0x84, 0x80, 0, 0, 2], |_| {}).unwrap_err();
        assert!(matches!(err, AppError::MalformedFrame(_)));
    }

    #[test]
    fn test_violating_message_is_not_delivered() {
        let mut decoder = FrameDecoder::new(LengthBounds::default());
        // a valid 2-byte message completed earlier in the chunk is still
        // delivered; the out-of-bounds one that follows is not
        let mut chunk = stream_of(&[b"ok"]);
        chunk.extend_from_slice(&[0x01, 0xff]);
        let mut messages = Vec::new();
        let err = decoder.feed(&chunk, |m| messages.push(m)).unwrap_err();
        assert!(matches!(err, AppError::MalformedFrame(_)));
        assert_eq!(messages.len(), 1);
        assert_eq!(&messages[0][..], b"ok");
    }
}
