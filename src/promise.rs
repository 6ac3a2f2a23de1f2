//! The read-only view over a resolution cell, and the combinators that chain
//! new cells off it.
//!
//! Every combinator takes an explicit [`Context`], creates its own child
//! cell, subscribes to the parent, and resolves the child with the
//! transformed outcome -- so a transform's failure becomes the child's
//! `Failure` instead of escaping onto some unrelated thread. The returned
//! promises form a chain rooted at the original [`Future`].

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{self, Poll};

use crate::context::Context;
use crate::future::{Future, Shared};
use crate::outcome::Outcome;
use crate::Dropped;

/// A clonable read view over exactly one [`Future`]. A promise can observe
/// the resolution and derive new promises, but never resolve the cell.
///
/// # Examples
///
/// ```
/// use promise_latch::{Future, Outcome, WorkerPool};
/// use futures::executor::block_on;
///
/// let cx = WorkerPool::new(2).into_context();
/// let future: Future<i32, String> = Future::new();
/// let chained = future
///     .promise()
///     .map(&cx, |n| n + 1)
///     .and_then(&cx, |n| {
///         if n % 2 == 0 {
///             Outcome::Success(n / 2)
///         } else {
///             Outcome::Failure("odd".to_string())
///         }
///     });
/// future.resolve_value(3);
/// assert_eq!(block_on(chained).unwrap(), Outcome::Success(2));
/// ```
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Promise<T, E> {
    pub(crate) fn new(shared: Arc<Shared<T, E>>) -> Self {
        Self { shared }
    }
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Runs `f` on the full outcome, success or failure, and resolves the
    /// child promise with whatever `f` returns. This is the one combinator
    /// that sees both branches; use `?` inside `f` for fallible transforms.
    pub fn then<U, F>(&self, cx: &Context, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Outcome<T, E>) -> Outcome<U, E> + Send + 'static,
    {
        let child: Future<U, E> = Future::new();
        let promise = child.promise();
        self.shared.subscribe(
            cx,
            Box::new(move |outcome| {
                child.resolve(f(outcome));
            }),
        );
        promise
    }

    /// Transforms a success value; a failure passes through to the child
    /// untouched, without invoking `f`.
    pub fn map<U, F>(&self, cx: &Context, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(cx, move |outcome| outcome.map(f))
    }

    /// Like [`map`](Promise::map) with a fallible transform: `f` may itself
    /// produce a failure, which becomes the child's failure.
    pub fn and_then<U, F>(&self, cx: &Context, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Outcome<U, E> + Send + 'static,
    {
        self.then(cx, move |outcome| outcome.and_then(f))
    }

    /// On success, invokes `f` to obtain a dependent promise and forwards its
    /// eventual result into the child -- one level of flattening. On failure,
    /// the failure propagates without invoking `f`.
    pub fn flat_map<U, F>(&self, cx: &Context, f: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U, E> + Send + 'static,
    {
        let child: Future<U, E> = Future::new();
        let promise = child.promise();
        let chain_cx = Arc::clone(cx);
        self.shared.subscribe(
            cx,
            Box::new(move |outcome| match outcome {
                Outcome::Success(value) => {
                    f(value).shared.subscribe(
                        &chain_cx,
                        Box::new(move |inner| {
                            child.resolve(inner);
                        }),
                    );
                }
                Outcome::Failure(error) => {
                    child.resolve(Outcome::Failure(error));
                }
            }),
        );
        promise
    }

    /// Side-effect-only failure observer; `f` runs solely when the cell
    /// resolves to a failure. Produces no new promise.
    pub fn on_failure<F>(&self, cx: &Context, f: F)
    where
        F: FnOnce(E) + Send + 'static,
    {
        self.shared.subscribe(
            cx,
            Box::new(move |outcome| {
                if let Outcome::Failure(error) = outcome {
                    f(error);
                }
            }),
        );
    }

    /// Resolves an externally supplied cell with this promise's eventual
    /// result, merging this chain into the target's. Returns the target's
    /// promise.
    pub fn pipe(&self, cx: &Context, target: Future<T, E>) -> Promise<T, E> {
        let promise = target.promise();
        self.shared.subscribe(
            cx,
            Box::new(move |outcome| {
                target.resolve(outcome);
            }),
        );
        promise
    }

    /// Waits on `promises` strictly in order, one at a time: position `i + 1`
    /// is not attached until position `i` succeeded. The first failure
    /// resolves the output immediately and the remaining promises are
    /// abandoned; on full success the values arrive in input order.
    pub fn sequence(cx: &Context, promises: Vec<Promise<T, E>>) -> Promise<Vec<T>, E> {
        let output: Future<Vec<T>, E> = Future::new();
        let promise = output.promise();
        sequence_step(Arc::clone(cx), promises.into(), Vec::new(), output);
        promise
    }
}

fn sequence_step<T, E>(
    cx: Context,
    mut rest: VecDeque<Promise<T, E>>,
    acc: Vec<T>,
    output: Future<Vec<T>, E>,
) where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let Some(next) = rest.pop_front() else {
        output.resolve(Outcome::Success(acc));
        return;
    };
    let mut values = acc;
    let chain_cx = Arc::clone(&cx);
    next.shared.subscribe(
        &cx,
        Box::new(move |outcome| match outcome {
            Outcome::Success(value) => {
                values.push(value);
                sequence_step(chain_cx, rest, values, output);
            }
            Outcome::Failure(error) => {
                output.resolve(Outcome::Failure(error));
            }
        }),
    );
}

/// Awaiting a promise yields the resolution, or [`Dropped`] if every producer
/// handle went away while the cell was still unresolved.
impl<T, E> std::future::Future for Promise<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<Outcome<T, E>, Dropped>;

    fn poll(self: Pin<&mut Self>, task_cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        match self.shared.poll_outcome(task_cx.waker()) {
            Some(ready) => Poll::Ready(ready),
            None => Poll::Pending,
        }
    }
}
