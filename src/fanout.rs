// ABOUTME: Bounded-concurrency task group with join-all and collect-all-errors semantics.
// ABOUTME: Every submitted task runs to completion; results come back in submission order.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;

/// A task that panicked instead of returning a result.
#[derive(Debug, Error)]
#[error("task panicked: {0}")]
pub struct TaskPanic(pub String);

/// Runs independent async operations on a worker pool of fixed size.
///
/// Unlike `try_join_all`, a failing task never cancels its siblings: the
/// whole failure set is observable once [`FanOut::run`] returns.
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    workers: usize,
}

impl FanOut {
    /// Pool sized to the parallelism unit (node count, file count, ...).
    /// A size of zero is raised to one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Lower the pool size to `cap` when one is configured.
    pub fn capped(self, cap: Option<usize>) -> Self {
        match cap {
            Some(cap) => Self::new(self.workers.min(cap)),
            None => self,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Spawn every task, wait for all of them, and collect their results.
    pub async fn run<I, Fut, T, E>(&self, tasks: I) -> FanOutReport<T, E>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<TaskPanic> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    // The semaphore is never closed, so the permit is always granted.
                    let _permit = semaphore.acquire_owned().await.ok();
                    task.await
                })
            })
            .collect();

        let results = join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(result) => result,
                Err(e) => Err(E::from(TaskPanic(e.to_string()))),
            })
            .collect();

        FanOutReport { results }
    }
}

/// Results of one fan-out, in submission order.
#[derive(Debug)]
pub struct FanOutReport<T, E> {
    results: Vec<Result<T, E>>,
}

impl<T, E> FanOutReport<T, E> {
    /// True iff every task succeeded. An empty fan-out succeeds.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(Result::is_ok)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[Result<T, E>] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &E> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Split into successful values and errors.
    pub fn partition(self) -> (Vec<T>, Vec<E>) {
        let mut ok = Vec::new();
        let mut err = Vec::new();
        for result in self.results {
            match result {
                Ok(value) => ok.push(value),
                Err(e) => err.push(e),
            }
        }
        (ok, err)
    }
}
