//! Scheduler port: deferred, cancellable, single-shot tasks.

use std::future::Future;
use std::time::Duration;

/// Handle to a scheduled task.
pub trait ScheduledTask: Send {
    /// Prevent the task from running. Safe to call repeatedly and after the
    /// task has already run.
    fn cancel(&self);
}

/// Runs a future once after a delay.
pub trait Scheduler: Send + Sync {
    type Task: ScheduledTask;

    /// Run `task` once `delay` has elapsed.
    fn schedule<F>(&self, delay: Duration, task: F) -> Self::Task
    where
        F: Future<Output = ()> + Send + 'static;
}
