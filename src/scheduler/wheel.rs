use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tokio::time::{self, Duration};
use tracing::{debug, warn};

use super::ScheduledTask;
use crate::Shutdown;

/// Largest schedulable delay, in ticks.
pub const MAX_DELAY_SECS: u64 = 600;

/// Wheel size: the maximum delay plus guard slots, so a task scheduled at
/// the maximum delay never lands in the slot currently being drained.
const WHEEL_SLOTS: usize = MAX_DELAY_SECS as usize + 2;

/// A timing wheel for fire-once deferred execution at tick granularity.
///
/// A circular array of per-slot FIFO queues; one driver task advances a
/// slot per tick and dispatches every task in it that wins its completion
/// claim. Different slots never contend: each queue has its own lock.
/// Recurring behavior is built by re-scheduling after each firing.
pub struct TimingWheel {
    slots: Vec<Mutex<VecDeque<Arc<ScheduledTask>>>>,
    /// Index of the most recently drained slot.
    current: AtomicUsize,
    tick: Duration,
    started: AtomicBool,
    notify_shutdown: broadcast::Sender<()>,
}

impl TimingWheel {
    /// A wheel ticking once per second, the scheduling granularity of the
    /// toolkit.
    pub fn new() -> Arc<TimingWheel> {
        TimingWheel::with_tick(Duration::from_secs(1))
    }

    pub fn with_tick(tick: Duration) -> Arc<TimingWheel> {
        let slots = (0..WHEEL_SLOTS)
            .map(|_| Mutex::new(VecDeque::new()))
            .collect();
        let (notify_shutdown, _) = broadcast::channel(1);
        Arc::new(TimingWheel {
            slots,
            current: AtomicUsize::new(WHEEL_SLOTS - 1),
            tick,
            started: AtomicBool::new(false),
            notify_shutdown,
        })
    }

    /// Spawns the driver task. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        let wheel = Arc::clone(self);
        let mut shutdown = Shutdown::new(self.notify_shutdown.subscribe());
        tokio::spawn(async move {
            let mut ticker = time::interval(wheel.tick);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        debug!("timing wheel driver stopped");
                        return;
                    }
                    _ = ticker.tick() => wheel.advance(),
                }
            }
        });
    }

    /// Schedules `task` to fire `delay` ticks from now: a delay of 0 fires
    /// on the next tick, the maximum delay fires max+1 ticks later.
    ///
    /// Delays above [`MAX_DELAY_SECS`] are clamped to the maximum; the
    /// wheel is not sized to represent them, and wrapping to an
    /// earlier-than-intended slot would fire the task early.
    pub fn add(&self, task: Arc<ScheduledTask>, delay: u64) {
        let delay = if delay > MAX_DELAY_SECS {
            warn!(
                "delay {} exceeds the wheel maximum {}, clamping",
                delay, MAX_DELAY_SECS
            );
            MAX_DELAY_SECS
        } else {
            delay
        };
        let index =
            (self.current.load(Ordering::Acquire) + delay as usize + 1) % WHEEL_SLOTS;
        self.slots[index].lock().push_back(task);
    }

    /// Stops future ticks. In-flight dispatched work is not awaited.
    pub fn close(&self) {
        let _ = self.notify_shutdown.send(());
    }

    /// Drains the slot whose time has arrived and dispatches every task in
    /// it that wins its claim; a task pre-empted by cancellation is dropped
    /// silently.
    fn advance(&self) {
        let index = (self.current.load(Ordering::Acquire) + 1) % WHEEL_SLOTS;
        let due: Vec<Arc<ScheduledTask>> = {
            let mut slot = self.slots[index].lock();
            slot.drain(..).collect()
        };
        self.current.store(index, Ordering::Release);

        for task in due {
            if let Some(callback) = task.claim() {
                tokio::spawn(async move { callback() });
            }
        }
    }
}
