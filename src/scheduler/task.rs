use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type TaskFn = Box<dyn FnOnce() + Send + 'static>;

/// Shared cancellation group for scheduled tasks.
///
/// Flipping the flag once cancels every task bound to the context: neither
/// the wheel's dispatch claim nor an explicit cancel succeeds afterwards.
#[derive(Debug, Default)]
pub struct TaskContext {
    completed: AtomicBool,
}

impl TaskContext {
    pub fn new() -> Arc<TaskContext> {
        Arc::new(TaskContext::default())
    }

    /// Marks the whole group complete.
    pub fn complete(&self) {
        self.completed.store(true, Ordering::Release);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

/// A fire-once deferred callback.
///
/// One atomic completion flag arbitrates the race between wheel-driven
/// dispatch and external cancellation: the first transition wins, so the
/// callback runs at most once and a task claimed for dispatch can no longer
/// be cancelled.
pub struct ScheduledTask {
    callback: Mutex<Option<TaskFn>>,
    completed: AtomicBool,
    context: Option<Arc<TaskContext>>,
}

impl ScheduledTask {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Arc<ScheduledTask> {
        Arc::new(ScheduledTask {
            callback: Mutex::new(Some(Box::new(callback))),
            completed: AtomicBool::new(false),
            context: None,
        })
    }

    pub fn with_context(
        callback: impl FnOnce() + Send + 'static,
        context: Arc<TaskContext>,
    ) -> Arc<ScheduledTask> {
        Arc::new(ScheduledTask {
            callback: Mutex::new(Some(Box::new(callback))),
            completed: AtomicBool::new(false),
            context: Some(context),
        })
    }

    /// Prevents the task from executing if it has not been claimed yet.
    ///
    /// Returns `false` only when the task's context is already complete.
    /// Whether this call won the flag or the task was already complete is
    /// deliberately not distinguished, while [`claim`](Self::claim) reports
    /// success only to the first claimant.
    pub fn cancel(&self) -> bool {
        if let Some(context) = &self.context {
            if context.is_completed() {
                return false;
            }
        }
        let _ = self
            .completed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);
        true
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Claims the task for dispatch, returning its callback to the first
    /// and only winner.
    pub(crate) fn claim(&self) -> Option<TaskFn> {
        if let Some(context) = &self.context {
            if context.is_completed() {
                return None;
            }
        }
        if self
            .completed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.callback.lock().take()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("completed", &self.is_completed())
            .field("has_context", &self.context.is_some())
            .finish()
    }
}
