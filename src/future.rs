//! The single-assignment resolution cell.
//!
//! A [`Future`] is the producer-side handle: it can be resolved exactly once,
//! and every subscriber -- whether it registered before or after resolution --
//! observes that one value, delivered asynchronously through its execution
//! context. The cell is a latch: a mutex guards the optional outcome together
//! with the pending registrations, so a racing `resolve` and `subscribe` can
//! never miss each other.

use std::mem;
use std::sync::Arc;
use std::task::Waker;

use parking_lot::Mutex;
use tracing::trace;

use crate::context::Context;
use crate::outcome::Outcome;
use crate::promise::Promise;

pub(crate) type Callback<T, E> = Box<dyn FnOnce(Outcome<T, E>) + Send + 'static>;

pub(crate) struct Shared<T, E> {
    state: Mutex<State<T, E>>,
}

struct State<T, E> {
    outcome: Option<Outcome<T, E>>,
    waiters: Vec<(Context, Callback<T, E>)>,
    wakers: Vec<Waker>,
    producer_gone: bool,
}

impl<T, E> Shared<T, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(State {
                outcome: None,
                waiters: Vec::new(),
                wakers: Vec::new(),
                producer_gone: false,
            }),
        }
    }
}

impl<T, E> Shared<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// First write wins. Returns the canonical outcome either way and, on the
    /// winning call, drains every pending registration through its context.
    pub(crate) fn resolve(&self, outcome: Outcome<T, E>) -> Outcome<T, E> {
        let (waiters, wakers) = {
            let mut state = self.state.lock();
            if let Some(existing) = &state.outcome {
                trace!("resolve ignored: cell already resolved");
                return existing.clone();
            }
            state.outcome = Some(outcome.clone());
            (mem::take(&mut state.waiters), mem::take(&mut state.wakers))
        };
        trace!(subscribers = waiters.len(), "cell resolved");
        for (cx, callback) in waiters {
            let value = outcome.clone();
            cx.execute(Box::new(move || callback(value)));
        }
        for waker in wakers {
            waker.wake();
        }
        outcome
    }

    /// Registers `callback` to run through `cx` with the resolution. A late
    /// subscriber replays: the callback still fires through the context,
    /// never inline on the caller's thread.
    pub(crate) fn subscribe(&self, cx: &Context, callback: Callback<T, E>) {
        let mut state = self.state.lock();
        if let Some(outcome) = state.outcome.clone() {
            drop(state);
            cx.execute(Box::new(move || callback(outcome)));
        } else {
            state.waiters.push((Arc::clone(cx), callback));
        }
    }
}

impl<T, E> Shared<T, E> {
    /// Single poll step for the await adapter; see the
    /// `std::future::Future` impl on [`Promise`].
    pub(crate) fn poll_outcome(&self, waker: &Waker) -> Option<Result<Outcome<T, E>, crate::Dropped>>
    where
        T: Clone,
        E: Clone,
    {
        let mut state = self.state.lock();
        if let Some(outcome) = &state.outcome {
            return Some(Ok(outcome.clone()));
        }
        if state.producer_gone {
            return Some(Err(crate::Dropped));
        }
        // Keep every distinct waker; a single stored waker loses wakeups
        // when the same cell is awaited from more than one task.
        if !state.wakers.iter().any(|w| w.will_wake(waker)) {
            state.wakers.push(waker.clone());
        }
        None
    }
}

/// The producer-side handle of a deferred value: a thread-safe cell resolved
/// at most once. Hand out read access with [`promise`](Future::promise).
///
/// # Examples
///
/// ```
/// use promise_latch::{Future, Outcome, WorkerPool};
/// use futures::executor::block_on;
///
/// let cx = WorkerPool::new(2).into_context();
/// let future: Future<String, String> = Future::new();
/// let greeting = future.promise().map(&cx, |name| format!("hello {name}"));
/// future.resolve_value("world".to_string());
/// assert_eq!(
///     block_on(greeting).unwrap(),
///     Outcome::Success("hello world".to_string()),
/// );
/// ```
pub struct Future<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Future<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// An empty, unresolved cell.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
        }
    }

    /// A cell born resolved with a success value.
    pub fn resolved(value: T) -> Self {
        let future = Self::new();
        future.resolve_value(value);
        future
    }

    /// A cell born resolved with a failure.
    pub fn rejected(error: E) -> Self {
        let future = Self::new();
        future.reject(error);
        future
    }

    pub fn from_outcome(outcome: Outcome<T, E>) -> Self {
        let future = Self::new();
        future.resolve(outcome);
        future
    }

    /// Resolves the cell. The first call wins; later calls are no-ops. The
    /// canonical outcome is returned either way, so a caller that lost the
    /// race can observe what won.
    pub fn resolve(&self, outcome: Outcome<T, E>) -> Outcome<T, E> {
        self.shared.resolve(outcome)
    }

    pub fn resolve_value(&self, value: T) -> Outcome<T, E> {
        self.resolve(Outcome::Success(value))
    }

    pub fn reject(&self, error: E) -> Outcome<T, E> {
        self.resolve(Outcome::Failure(error))
    }

    /// Registers `callback` to run through `cx` once the cell resolves.
    ///
    /// Registration order does not fix callback execution order unless the
    /// context serializes its jobs. If the cell is never resolved the
    /// callback never fires.
    pub fn subscribe<F>(&self, cx: &Context, callback: F)
    where
        F: FnOnce(Outcome<T, E>) + Send + 'static,
    {
        self.shared.subscribe(cx, Box::new(callback));
    }

    /// A read-only view; promises can observe and chain but never resolve.
    pub fn promise(&self) -> Promise<T, E> {
        Promise::new(Arc::clone(&self.shared))
    }

    pub fn is_resolved(&self) -> bool {
        self.shared.state.lock().outcome.is_some()
    }
}

impl<T, E> Default for Future<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Drop for Future<T, E> {
    /// Dropping an unresolved producer discards its pending registrations
    /// (they could never fire anyway) and wakes awaiting tasks so `.await`
    /// reports [`Dropped`](crate::Dropped) instead of hanging.
    fn drop(&mut self) {
        let (waiters, wakers) = {
            let mut state = self.shared.state.lock();
            if state.outcome.is_some() {
                return;
            }
            state.producer_gone = true;
            (mem::take(&mut state.waiters), mem::take(&mut state.wakers))
        };
        // Dropping the callbacks outside the lock: they own child cells, and
        // those cells take their own locks when they drop.
        drop(waiters);
        for waker in wakers {
            waker.wake();
        }
    }
}
