//! One-shot, thread-safe futures with replaying promise combinators.
//!
//! A producer creates a [`Future`] -- a single-assignment resolution cell --
//! and hands out its [`Promise`], a read-only view that can observe the
//! resolution and chain transforms but never resolve the cell itself. The
//! cell resolves exactly once, first write wins, and the resolution replays
//! to every subscriber: ones registered before and ones registered after
//! both hear the same value, always asynchronously through an explicit
//! execution [`Context`].
//!
//! Failures are data, not unwinds: an [`Outcome::Failure`] short-circuits
//! through `map`/`and_then`/`flat_map` untouched until an observer inspects
//! it. The companion [`CancellationToken`] is the same one-shot latch with
//! no payload.
//!
//! ```
//! use promise_latch::{Future, Outcome, WorkerPool};
//! use futures::executor::block_on;
//! use std::thread;
//!
//! let cx = WorkerPool::new(2).into_context();
//! let future: Future<i32, String> = Future::new();
//! let doubled = future.promise().map(&cx, |n| n * 2);
//!
//! let producer = future;
//! thread::spawn(move || {
//!     producer.resolve_value(21);
//! });
//!
//! assert_eq!(block_on(doubled).unwrap(), Outcome::Success(42));
//! ```

use thiserror::Error;

pub mod cancel;
pub mod context;
pub mod future;
pub mod outcome;
pub mod promise;

pub use cancel::CancellationToken;
pub use context::{Context, ExecutionContext, Job, SerialQueue, WorkerPool};
pub use future::Future;
pub use outcome::Outcome;
pub use promise::Promise;

/// Returned by awaiting a [`Promise`] whose producing [`Future`] was dropped
/// while still unresolved; the cell can never resolve, so the await reports
/// it instead of pending forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the producing future was dropped before resolution")]
pub struct Dropped;
