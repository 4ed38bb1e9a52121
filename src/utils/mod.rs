pub use clock::MonotonicClock;
pub use random::Randomizer;

pub mod byte_order;
pub mod hash;

mod clock;
mod random;
