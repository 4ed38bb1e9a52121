//! servkit: a server-side toolkit for high-concurrency, message-oriented
//! network services.
//!
//! Four cooperating pieces: the length-prefix [`codec`], the
//! [`network::IoBufferPool`] backing each connection's receive path, the
//! [`scheduler::TimingWheel`] for fire-once deferred work at second
//! granularity, and the [`monitor::LivenessMonitor`] that evicts entities
//! which stop reporting liveness. Everything is an explicitly constructed
//! service object; the embedding server owns startup and shutdown.

pub mod codec;
pub mod monitor;
pub mod network;
pub mod scheduler;
pub mod service;
pub mod utils;

pub use codec::{FrameDecoder, HeadedBuffer, LengthBounds, Message, MsgBuilder};
pub use monitor::{LivenessMonitor, Monitorable};
pub use network::{ChannelEvents, IoBufferLease, IoBufferPool, MessageChannel};
pub use scheduler::{ScheduledTask, TaskContext, TimingWheel, MAX_DELAY_SECS};
pub use service::{setup_local_tracing, AppError, AppResult, ServkitConfig, Shutdown};
pub use utils::{MonotonicClock, Randomizer};
