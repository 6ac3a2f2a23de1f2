//! Execution contexts: the "run this callback later" capability every
//! subscription is dispatched through.
//!
//! The cells in this crate never run threads of their own and never block;
//! they hand closures to a [`Context`] supplied by the caller. There are no
//! process-wide default contexts -- construct a [`WorkerPool`] or a
//! [`SerialQueue`] at application start and pass it everywhere a combinator
//! is invoked.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An opaque scheduling capability. Implementations run the job later,
/// asynchronously relative to the caller, under whatever concurrency policy
/// they choose.
pub trait ExecutionContext: Send + Sync {
    fn execute(&self, job: Job);
}

/// The handle subscriptions hold onto.
pub type Context = Arc<dyn ExecutionContext>;

fn spawn_worker(name: String, jobs: Receiver<Job>) {
    thread::Builder::new()
        .name(name)
        .spawn(move || {
            while let Ok(job) = jobs.recv() {
                job();
            }
            trace!("context dropped, worker exiting");
        })
        .expect("failed to spawn context worker thread");
}

/// A pool of worker threads sharing one job queue: the background context.
/// Jobs run in submission order per worker but concurrently across workers.
///
/// Dropping the pool closes the queue; already-submitted jobs still drain
/// before the workers exit.
pub struct WorkerPool {
    jobs: Sender<Job>,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let (jobs, queue) = crossbeam_channel::unbounded::<Job>();
        for index in 0..threads {
            spawn_worker(format!("promise-worker-{index}"), queue.clone());
        }
        debug!(threads, "worker pool started");
        Self { jobs, threads }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn into_context(self) -> Context {
        Arc::new(self)
    }
}

impl Default for WorkerPool {
    /// One worker per available core.
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl ExecutionContext for WorkerPool {
    fn execute(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            trace!("job dropped: worker pool is shutting down");
        }
    }
}

/// A dedicated single thread running jobs strictly in submission order: the
/// serial, main-thread-like context.
pub struct SerialQueue {
    jobs: Sender<Job>,
}

impl SerialQueue {
    pub fn new() -> Self {
        let (jobs, queue) = crossbeam_channel::unbounded::<Job>();
        spawn_worker("promise-serial".to_string(), queue);
        Self { jobs }
    }

    pub fn into_context(self) -> Context {
        Arc::new(self)
    }
}

impl Default for SerialQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext for SerialQueue {
    fn execute(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            trace!("job dropped: serial queue is shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, ExecutionContext, SerialQueue, WorkerPool};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn pool_runs_jobs_off_the_calling_thread() {
        let pool = WorkerPool::new(2);
        let caller = std::thread::current().id();
        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || {
            tx.send(std::thread::current().id()).unwrap();
        }));
        let worker = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_ne!(caller, worker);
    }

    #[test]
    fn pool_clamps_to_one_thread() {
        assert_eq!(WorkerPool::new(0).threads(), 1);
    }

    #[test]
    fn serial_queue_preserves_submission_order() {
        let cx: Context = SerialQueue::new().into_context();
        let (tx, rx) = mpsc::channel();
        for n in 0..10 {
            let tx = tx.clone();
            cx.execute(Box::new(move || {
                tx.send(n).unwrap();
            }));
        }
        let seen: Vec<i32> = (0..10)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn pending_jobs_drain_after_drop() {
        let pool = WorkerPool::new(1);
        let (tx, rx) = mpsc::channel();
        for n in 0..3 {
            let tx = tx.clone();
            pool.execute(Box::new(move || {
                tx.send(n).unwrap();
            }));
        }
        drop(pool);
        for n in 0..3 {
            assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), n);
        }
    }
}
