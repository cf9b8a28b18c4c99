// ABOUTME: One-shot delayed job execution on the tokio runtime
// ABOUTME: Batches are admitted all-or-nothing against a bounded pending-job budget

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Work to run once a job's delay elapses
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct TimerJob {
    pub delay: Duration,
    pub job: Job,
}

impl TimerJob {
    pub fn new<F>(delay: Duration, job: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            job: Box::pin(job),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("no async runtime available to run scheduled jobs")]
    NoRuntime,

    #[error("timer is full: {requested} jobs requested, {available} slots free")]
    Exhausted { requested: usize, available: usize },
}

impl ScheduleError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::NoRuntime => "no_runtime",
            ScheduleError::Exhausted { .. } => "exhausted",
        }
    }
}

/// Runs jobs after a delay. Delays are measured from the `schedule` call.
///
/// Jobs are fire-and-forget: once accepted they always run. A failed batch
/// schedules nothing.
pub trait Timer: Send + Sync {
    fn schedule(&self, jobs: Vec<TimerJob>) -> Result<(), ScheduleError>;
}

/// Timer backed by one tokio task per job.
///
/// Each pending job holds a permit until it has run; tasks are detached, a
/// handle-tracking variant could add cancellation behind the same trait.
pub struct TokioTimer {
    permits: Arc<Semaphore>,
}

impl TokioTimer {
    pub fn new(max_pending: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_pending)),
        }
    }

    /// Slots currently free for new jobs
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Timer for TokioTimer {
    fn schedule(&self, jobs: Vec<TimerJob>) -> Result<(), ScheduleError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;
        let now = Instant::now();

        let requested = jobs.len();
        let mut permits = Vec::with_capacity(requested);
        for _ in 0..requested {
            match Arc::clone(&self.permits).try_acquire_owned() {
                Ok(permit) => permits.push(permit),
                Err(_) => {
                    return Err(ScheduleError::Exhausted {
                        requested,
                        available: self.permits.available_permits() + permits.len(),
                    });
                }
            }
        }

        for (job, permit) in jobs.into_iter().zip(permits) {
            let deadline = now + job.delay;
            handle.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                job.job.await;
                drop(permit);
            });
        }
        Ok(())
    }
}
