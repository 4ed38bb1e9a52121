//! Timing-wheel task scheduler.
//!
//! Fire-once deferred execution with race-safe cancellation, sized for tens
//! of thousands of timers: a fixed circular array of time-bucketed queues
//! advanced one bucket per tick. Dispatch and cancellation share a single
//! complete-once flag, so first writer wins and nothing runs twice.

pub use task::{ScheduledTask, TaskContext};
pub use wheel::{TimingWheel, MAX_DELAY_SECS};

mod task;
mod wheel;
