use std::time::Instant;

/// Monotonic elapsed-time source.
///
/// Exposes elapsed time since construction at several resolutions; the zero
/// point is arbitrary, only differences are meaningful. An explicit object
/// rather than process-wide state: the owner constructs one and shares it
/// with the components that tell time.
#[derive(Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            start: Instant::now(),
        }
    }

    pub fn minutes(&self) -> u64 {
        self.start.elapsed().as_secs() / 60
    }

    pub fn seconds(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    pub fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock::new()
    }
}
