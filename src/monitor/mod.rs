//! Liveness monitor: periodic eviction of entities that stop reporting
//! liveness.
//!
//! Built on the timing wheel's fire-once tasks; each sweep walks the
//! tracked set once, drops everything whose predicate says dead, and
//! re-arms itself for the next period.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::scheduler::{ScheduledTask, TimingWheel};
use crate::utils::MonotonicClock;

/// An externally owned entity the monitor polls for liveness.
pub trait Monitorable: Send + Sync + 'static {
    /// Whether the entity is still alive at `now_secs` on the monitor's
    /// clock. Returning `false` evicts it; it is never evaluated again.
    fn is_alive(&self, now_secs: u64) -> bool;
}

/// Tracks entities and evicts dead ones on a recurring cadence.
///
/// Only the append path takes the list lock while external callers can
/// contend; the sweep swaps the list out, evaluates predicates outside the
/// lock, and merges back anything appended meanwhile, so a predicate may
/// safely call [`add`](Self::add).
pub struct LivenessMonitor {
    wheel: Arc<TimingWheel>,
    clock: Arc<MonotonicClock>,
    entities: Mutex<Vec<Arc<dyn Monitorable>>>,
    period_secs: AtomicU64,
    running: AtomicBool,
}

impl LivenessMonitor {
    pub fn new(wheel: Arc<TimingWheel>, clock: Arc<MonotonicClock>) -> Arc<LivenessMonitor> {
        Arc::new(LivenessMonitor {
            wheel,
            clock,
            entities: Mutex::new(Vec::new()),
            period_secs: AtomicU64::new(0),
            running: AtomicBool::new(false),
        })
    }

    /// Appends an entity in constant time. Entities are removed exactly
    /// once, by a sweep, or never if perpetually alive.
    pub fn add(&self, entity: Arc<dyn Monitorable>) {
        self.entities.lock().push(entity);
    }

    /// Number of currently tracked entities.
    pub fn tracked(&self) -> usize {
        self.entities.lock().len()
    }

    /// Schedules the first sweep `period_secs` from now. Idempotent.
    pub fn start(self: &Arc<Self>, period_secs: u64) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        self.period_secs.store(period_secs, Ordering::Release);
        self.schedule_sweep();
    }

    /// Lets the current sweep finish and stops re-arming.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn schedule_sweep(self: &Arc<Self>) {
        let monitor = Arc::clone(self);
        let task = ScheduledTask::new(move || monitor.sweep());
        self.wheel
            .add(task, self.period_secs.load(Ordering::Acquire));
    }

    fn sweep(self: &Arc<Self>) {
        let now_secs = self.clock.seconds();

        let tracked = std::mem::take(&mut *self.entities.lock());
        let before = tracked.len();
        let mut alive: Vec<Arc<dyn Monitorable>> = tracked
            .into_iter()
            .filter(|entity| entity.is_alive(now_secs))
            .collect();
        let evicted = before - alive.len();

        {
            let mut entities = self.entities.lock();
            // entries appended while predicates ran go after the survivors
            alive.append(&mut entities);
            *entities = alive;
        }
        if evicted > 0 {
            debug!("liveness sweep at {}s evicted {} entities", now_secs, evicted);
        }

        // a fire-once scheduler implements periodic behavior by re-arming
        if self.running.load(Ordering::Acquire) {
            self.schedule_sweep();
        }
    }
}
