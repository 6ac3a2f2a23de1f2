//! A one-shot cancellation signal: the same resolve-once, replay-to-all
//! latch as the resolution cell, specialized to no payload.
//!
//! The token is a standalone signal composed by callers; it is deliberately
//! not wired into promise chains, so cancelling a token does not abort
//! in-flight combinators.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::context::{Context, Job};

/// A thread-safe flag that flips to cancelled at most once and replays that
/// event to every handler, past or future. Clones share the same flag.
///
/// # Examples
///
/// ```
/// use promise_latch::{CancellationToken, WorkerPool};
/// use std::sync::mpsc;
///
/// let cx = WorkerPool::new(1).into_context();
/// let token = CancellationToken::new();
/// let (tx, rx) = mpsc::channel();
/// token.on_cancel(&cx, move || {
///     tx.send(()).unwrap();
/// });
/// token.cancel();
/// rx.recv().unwrap();
/// assert!(token.cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Mutex<CancelState>>,
}

struct CancelState {
    cancelled: bool,
    handlers: Vec<(Context, Job)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CancelState {
                cancelled: false,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }

    /// Flips the flag and fires every registered handler exactly once,
    /// through the context it was registered with. Idempotent: later calls
    /// are no-ops.
    pub fn cancel(&self) {
        let handlers = {
            let mut state = self.inner.lock();
            if state.cancelled {
                trace!("cancel ignored: token already cancelled");
                return;
            }
            state.cancelled = true;
            mem::take(&mut state.handlers)
        };
        debug!(handlers = handlers.len(), "token cancelled");
        for (cx, handler) in handlers {
            cx.execute(handler);
        }
    }

    /// Registers `handler` to run through `cx` on cancellation. If the token
    /// is already cancelled the handler still fires, asynchronously, exactly
    /// once. There is no un-registration.
    pub fn on_cancel<F>(&self, cx: &Context, handler: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.lock();
        if state.cancelled {
            drop(state);
            cx.execute(Box::new(handler));
        } else {
            state.handlers.push((Arc::clone(cx), Box::new(handler)));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;
    use crate::context::WorkerPool;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn cancel_fires_each_handler_exactly_once() {
        let cx = WorkerPool::new(2).into_context();
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            let tx = tx.clone();
            token.on_cancel(&cx, move || {
                tx.send(()).unwrap();
            });
        }

        token.cancel();
        token.cancel();

        for _ in 0..3 {
            rx.recv_timeout(WAIT).unwrap();
        }
        // A second cancel must not re-fire anything.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn late_handler_still_fires_asynchronously() {
        let cx = WorkerPool::new(1).into_context();
        let token = CancellationToken::new();
        token.cancel();

        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();
        token.on_cancel(&cx, move || {
            tx.send(thread::current().id()).unwrap();
        });
        assert_ne!(rx.recv_timeout(WAIT).unwrap(), caller);
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.cancelled());
    }

    #[test]
    fn uncancelled_token_defers_handlers() {
        let cx = WorkerPool::new(1).into_context();
        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel();
        token.on_cancel(&cx, move || {
            tx.send(()).unwrap();
        });
        assert!(!token.cancelled());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
