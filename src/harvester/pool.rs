//! Bounded worker pool
//!
//! A fixed set of workers drains a shared job queue. Each worker value is
//! owned by exactly one task for the duration of a `map` call, so
//! per-worker resources such as an HTTP session are never shared.
//! Results come back in job order regardless of completion order.

use crate::HarvestError;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

/// A fixed-size pool of workers
#[derive(Debug, Clone)]
pub struct WorkerPool<W> {
    workers: Vec<W>,
}

type JobQueue<T> = Arc<Mutex<VecDeque<(usize, T)>>>;

impl<W> WorkerPool<W>
where
    W: Clone + Send + Sync + 'static,
{
    /// Creates a pool from its workers; the pool size is the number of workers
    pub fn new(workers: Vec<W>) -> Self {
        Self { workers }
    }

    /// Number of workers in the pool
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Runs `handler` over every job with at most `size()` jobs in flight
    ///
    /// # Arguments
    ///
    /// * `jobs` - Work items, processed in queue order
    /// * `handler` - Called with a worker and a job; its future runs on a tokio task
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<R>)` - One result per job, in the order the jobs were given
    /// * `Err(HarvestError::Worker)` - A worker task panicked or the pool is empty
    pub async fn map<T, R, F, Fut>(&self, jobs: Vec<T>, handler: F) -> Result<Vec<R>, HarvestError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(W, T) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        if self.workers.is_empty() {
            return Err(HarvestError::Worker("worker pool is empty".to_string()));
        }

        let total = jobs.len();
        let queue: JobQueue<T> = Arc::new(Mutex::new(jobs.into_iter().enumerate().collect()));

        let mut tasks = JoinSet::new();
        for worker in self.workers.iter().take(total).cloned() {
            let queue = Arc::clone(&queue);
            let handler = handler.clone();

            tasks.spawn(async move {
                let mut done = Vec::new();
                while let Some((index, job)) = next_job(&queue) {
                    done.push((index, handler(worker.clone(), job).await));
                }
                done
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            let done = joined.map_err(|e| HarvestError::Worker(e.to_string()))?;
            results.extend(done);
        }

        if results.len() != total {
            return Err(HarvestError::Worker(format!(
                "{} of {} jobs produced no result",
                total - results.len(),
                total
            )));
        }

        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }
}

/// Pops the next job; a poisoned queue is still drained
fn next_job<T>(queue: &JobQueue<T>) -> Option<(usize, T)> {
    let mut guard = match queue.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.pop_front()
}
