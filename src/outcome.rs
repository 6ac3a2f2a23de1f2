//! The resolution payload: success carrying a value, or failure carrying an
//! error. Pure data; a settled [`Outcome`] never changes.

/// The value a future settles on. Unlike a bare `Result`, an `Outcome` is a
/// payload the cell stores and replays; the crate's own errors (such as
/// [`Dropped`](crate::Dropped)) stay out of it.
///
/// # Examples
///
/// ```
/// use promise_latch::Outcome;
///
/// let n: Outcome<i32, String> = Outcome::Success(20);
/// assert_eq!(n.map(|v| v + 1), Outcome::Success(21));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Success(T),
    Failure(E),
}

impl<T, E> Outcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The contained value, if this is a success.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// The contained error, if this is a failure.
    pub fn error(&self) -> Option<&E> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Transforms a success value; a failure passes through untouched.
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Transforms a success value with a fallible function; the function's
    /// own failure becomes this outcome's failure. A failure passes through
    /// without invoking `f`.
    pub fn and_then<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Outcome<U, E>,
    {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(error) => Outcome::Failure(error),
        }
    }

    /// Collapses the outcome back into a `Result`, handing a failure to the
    /// caller's error path (pairs with `?`).
    pub fn realize(self) -> Result<T, E> {
        self.into()
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Outcome;

    #[test]
    fn map_transforms_success() {
        let outcome: Outcome<i32, String> = Outcome::Success(2);
        assert_eq!(outcome.map(|v| v * 10), Outcome::Success(20));
    }

    #[test]
    fn map_skips_failure() {
        let outcome: Outcome<i32, String> = Outcome::Failure("broken".into());
        let mapped = outcome.map(|_| unreachable!("map must not run on failure"));
        assert_eq!(mapped, Outcome::<i32, String>::Failure("broken".into()));
    }

    #[test]
    fn and_then_may_fail() {
        let outcome: Outcome<i32, String> = Outcome::Success(2);
        let chained = outcome.and_then(|v| {
            if v > 0 {
                Outcome::Success(v + 1)
            } else {
                Outcome::Failure("negative".to_string())
            }
        });
        assert_eq!(chained, Outcome::Success(3));

        let failing: Outcome<i32, String> = Outcome::Success(-1);
        let chained = failing.and_then(|_| Outcome::<i32, String>::Failure("negative".to_string()));
        assert_eq!(chained, Outcome::Failure("negative".to_string()));
    }

    #[test]
    fn realize_yields_value_or_error() {
        let ok: Outcome<i32, String> = Outcome::Success(7);
        assert_eq!(ok.realize(), Ok(7));

        let err: Outcome<i32, String> = Outcome::Failure("nope".into());
        assert_eq!(err.realize(), Err("nope".to_string()));
    }

    #[test]
    fn accessors() {
        let ok: Outcome<i32, String> = Outcome::Success(7);
        assert!(ok.is_success());
        assert_eq!(ok.value(), Some(&7));
        assert_eq!(ok.error(), None);

        let err: Outcome<i32, String> = Outcome::Failure("nope".into());
        assert!(err.is_failure());
        assert_eq!(err.value(), None);
        assert_eq!(err.error(), Some(&"nope".to_string()));
    }
}
