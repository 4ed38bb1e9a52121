//! Length-prefix codec: BER-style length octets, frame builders, and the
//! incremental framing state machine.
//!
//! Wire format per message: `[length-prefix][payload]`. One octet `L <= 127`
//! encodes the payload length directly; otherwise the first octet's low 7
//! bits name the count (1..=4) of following big-endian length octets,
//! supporting payloads up to `i32::MAX` bytes.

pub use builder::{HeadedBuffer, Message, MsgBuilder, HEADER_SLACK};
pub use decoder::{FrameDecoder, LengthBounds};
pub use length_prefix::{decode_extended, encoded_len, write_prefix, MAX_PAYLOAD_LEN};

mod builder;
mod decoder;
mod length_prefix;
