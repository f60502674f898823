//! Bounded worker pool for AI requests
//!
//! Mirrors a classic core/max thread pool on tokio tasks: up to
//! `core_pool_size` long-lived workers, a bounded queue, and surge workers up
//! to `max_pool_size` that retire after `keep_alive` of idleness. When the
//! queue is full and no surge worker can be started the submission is
//! rejected with `ExecutorRejected`; work is never dropped silently.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::{InsightsError, Result};

pub const CORE_POOL_SIZE: usize = 5;
pub const MAX_POOL_SIZE: usize = 10;
pub const QUEUE_CAPACITY: usize = 50;
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    pub queue_capacity: usize,
    pub keep_alive: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_pool_size: CORE_POOL_SIZE,
            max_pool_size: MAX_POOL_SIZE,
            queue_capacity: QUEUE_CAPACITY,
            keep_alive: KEEP_ALIVE,
        }
    }
}

struct Shared {
    receiver: Mutex<mpsc::Receiver<Job>>,
    live_workers: AtomicUsize,
    next_worker_id: AtomicUsize,
}

impl Shared {
    async fn next_job(&self) -> Option<Job> {
        self.receiver.lock().await.recv().await
    }
}

/// Executor for AI requests. Must be used from within a tokio runtime.
pub struct AiExecutor {
    config: ExecutorConfig,
    sender: mpsc::Sender<Job>,
    shared: Arc<Shared>,
}

impl AiExecutor {
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        info!(
            core = config.core_pool_size,
            max = config.max_pool_size,
            queue_cap = config.queue_capacity,
            "Initializing AI executor"
        );

        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            config,
            sender,
            shared: Arc::new(Shared {
                receiver: Mutex::new(receiver),
                live_workers: AtomicUsize::new(0),
                next_worker_id: AtomicUsize::new(1),
            }),
        }
    }

    pub fn config(&self) -> ExecutorConfig {
        self.config
    }

    /// Workers currently alive (core and surge).
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers.load(Ordering::Acquire)
    }

    /// Tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.config.queue_capacity.max(1) - self.sender.capacity()
    }

    /// Submit `task`, returning a receiver for its output.
    ///
    /// Fails with `ExecutorRejected` when the queue is full and the pool is
    /// already at its maximum size.
    pub fn submit<F, T>(&self, task: F) -> Result<oneshot::Receiver<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let _ = tx.send(task.await);
        });

        if self.try_reserve_worker(self.config.core_pool_size) {
            self.spawn_worker(job, true);
            return Ok(rx);
        }

        let job = match self.sender.try_send(job) {
            Ok(()) => return Ok(rx),
            Err(TrySendError::Full(job)) => job,
            Err(TrySendError::Closed(_)) => {
                return Err(InsightsError::ExecutorRejected(
                    "executor is shut down".to_string(),
                ))
            }
        };

        if self.try_reserve_worker(self.config.max_pool_size) {
            self.spawn_worker(job, false);
            return Ok(rx);
        }

        warn!(
            workers = self.live_workers(),
            queued = self.queued(),
            "AI executor saturated, rejecting request"
        );
        Err(InsightsError::ExecutorRejected(format!(
            "queue full ({} queued) with {} workers busy",
            self.config.queue_capacity, self.config.max_pool_size
        )))
    }

    /// Submit `task` and wait for its output.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(task)?.await.map_err(|_| {
            InsightsError::ExecutorRejected("worker dropped the task before completion".to_string())
        })
    }

    fn try_reserve_worker(&self, limit: usize) -> bool {
        self.shared
            .live_workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            })
            .is_ok()
    }

    fn spawn_worker(&self, first: Job, core: bool) {
        let shared = Arc::clone(&self.shared);
        let keep_alive = self.config.keep_alive;
        let id = shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        debug!(core, "Created new worker AI-Worker-{}", id);

        // Owned by the task future, so a worker dropped with its runtime
        // (even before first poll) still gives its slot back.
        let slot = WorkerSlot {
            shared: Arc::clone(&shared),
            id,
        };

        tokio::spawn(async move {
            let _slot = slot;
            run_job(id, first).await;

            loop {
                let next = if core {
                    shared.next_job().await
                } else {
                    tokio::time::timeout(keep_alive, shared.next_job())
                        .await
                        .unwrap_or(None)
                };

                match next {
                    Some(job) => run_job(id, job).await,
                    None => break,
                }
            }
        });
    }
}

struct WorkerSlot {
    shared: Arc<Shared>,
    id: usize,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.shared.live_workers.fetch_sub(1, Ordering::AcqRel);
        debug!("AI-Worker-{} retired", self.id);
    }
}

impl Default for AiExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one job in its own task so a panic cannot take the worker down.
async fn run_job(worker: usize, job: Job) {
    if let Err(e) = tokio::spawn(job).await {
        error!("Task on AI-Worker-{} failed: {}", worker, e);
    }
}
