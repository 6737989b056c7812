//! Tokio-backed implementation of the [`Scheduler`] port.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ports::{ScheduledTask, Scheduler};

/// Runs each scheduled future on its own tokio task after sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

/// Handle to a sleeping tokio task. Cancelling aborts it.
#[derive(Debug)]
pub struct TokioTask(JoinHandle<()>);

impl ScheduledTask for TokioTask {
    fn cancel(&self) {
        // abort is a no-op on a task that already completed
        self.0.abort();
    }
}

impl Scheduler for TokioScheduler {
    type Task = TokioTask;

    fn schedule<F>(&self, delay: Duration, task: F) -> Self::Task
    where
        F: Future<Output = ()> + Send + 'static,
    {
        TokioTask(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }))
    }
}
