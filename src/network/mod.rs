//! Network Module Implementation
//!
//! Per-connection plumbing for message-oriented servers: a pool of
//! fixed-size receive buffers and the channel that frames one socket's byte
//! stream into discrete messages.
//!
//! # Components
//!
//! - `IoBufferPool` / `IoBufferLease`: pre-allocated receive buffers, leased
//!   one per connection and reclaimed on every teardown path
//! - `MessageChannel`: the framing state machine and serialized outbound
//!   queue for one accepted socket
//! - `ChannelEvents`: the owner-registered delivery and error callbacks
//!
//! Accept loops and handshakes are the embedding server's business; a
//! channel starts with bytes already flowing on an established stream.

pub use buffer_pool::{IoBufferLease, IoBufferPool};
pub use channel::{ChannelEvents, MessageChannel};

mod buffer_pool;
mod channel;
