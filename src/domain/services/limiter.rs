#[cfg(test)]
#[path = "limiter_test.rs"]
mod tests;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::Semaphore;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Caps how many scheduled tasks run at once across the whole process. Tasks
/// beyond the limit wait in submission order and are admitted as soon as a
/// running task settles.
#[derive(Clone)]
pub struct RateLimitedInvoker {
    jobs: mpsc::UnboundedSender<Job>,
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl RateLimitedInvoker {
    /// Must be called from within a tokio runtime, the dispatcher is spawned
    /// immediately.
    pub fn new(limit: usize) -> RateLimitedInvoker {
        let limit = limit.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let (jobs, rx) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(dispatch(semaphore.clone(), rx));

        return RateLimitedInvoker {
            jobs,
            semaphore,
            limit,
        };
    }

    pub fn limit(&self) -> usize {
        return self.limit;
    }

    /// Number of tasks currently holding a slot.
    pub fn in_flight(&self) -> usize {
        return self.limit - self.semaphore.available_permits();
    }

    /// Queues `task` right away and returns a future for its result. Dropping
    /// the returned future does not cancel the task, it still runs when its
    /// turn comes.
    pub fn schedule<F, Fut, T>(&self, task: F) -> impl Future<Output = Result<T>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<T>();
        let job: Job = Box::pin(async move {
            let res = task().await;
            let _ = tx.send(res);
        });
        let queued = self.jobs.send(job).is_ok();

        return async move {
            if !queued {
                bail!("Rate limiter is no longer running");
            }

            return rx
                .await
                .map_err(|_| return anyhow!("Scheduled task stopped before returning a result"));
        };
    }
}

async fn dispatch(semaphore: Arc<Semaphore>, mut rx: mpsc::UnboundedReceiver<Job>) {
    loop {
        let job = match rx.recv().await {
            Some(job) => job,
            None => return,
        };

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        tokio::spawn(async move {
            job.await;
            drop(permit);
        });
    }
}
