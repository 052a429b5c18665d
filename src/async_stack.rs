//! Detecting errors that crossed an asynchronous boundary.
//!
//! [`prep_async_stack`] records the stack where an asynchronous operation
//! starts and schedules a marker through the caller's event loop.  When the
//! operation fails later, [`AsyncStackFinisher::finish`] attaches the
//! recorded stack to the error, but only if the marker ran in between, i.e.
//! the error was not raised synchronously.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::capture_stack_text;
use crate::errorlike::ErrorLike;

/// A deferred callback handed to the scheduler.
pub type Marker = Box<dyn FnOnce() + Send + 'static>;

/// Attaches a recorded origin stack to errors raised asynchronously.
#[derive(Debug, Clone)]
pub struct AsyncStackFinisher {
    stack: String,
    skip: usize,
    crossed: Arc<AtomicBool>,
}

impl AsyncStackFinisher {
    /// Checks whether the scheduled marker has run.
    pub fn crossed_boundary(&self) -> bool {
        self.crossed.load(Ordering::SeqCst)
    }

    /// Attaches the recorded stack to `error` as its async stack.
    ///
    /// Nothing happens if no asynchronous boundary was crossed yet or if the
    /// error already has an async stack.  Returns whether the stack was
    /// attached.
    pub fn finish<E: ErrorLike + ?Sized>(&self, error: &mut E) -> bool {
        if !self.crossed_boundary() || error.async_stack().is_some() {
            return false;
        }

        let mut lines: Vec<&str> = self.stack.split('\n').collect();
        let end = (1 + self.skip).min(lines.len());
        lines.drain(1.min(end)..end);
        error.set_async_stack(lines.join("\n"));
        traceable_debug!("attached async stack skipping {} frame(s)", self.skip);
        true
    }
}

/// Records the current stack and schedules the boundary marker.
///
/// `schedule` receives the marker and must run it once control returned to
/// the event loop, e.g. on the next tick.  `skip` frames below the caller
/// are removed from the recorded stack when it is attached.
#[inline(never)]
pub fn prep_async_stack<F>(skip: usize, schedule: F) -> AsyncStackFinisher
where
    F: FnOnce(Marker),
{
    let crossed = Arc::new(AtomicBool::new(false));
    let stack = capture_stack_text("Error");

    let flag = crossed.clone();
    schedule(Box::new(move || flag.store(true, Ordering::SeqCst)));

    AsyncStackFinisher {
        stack,
        skip,
        crossed,
    }
}

/// Like [`prep_async_stack`], scheduling the marker as a tokio task.
///
/// Must be called from within a tokio runtime.
#[cfg(feature = "tokio")]
#[inline(never)]
pub fn prep_async_stack_tokio(skip: usize) -> AsyncStackFinisher {
    prep_async_stack(skip, |marker| {
        tokio::spawn(async move { marker() });
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::errorlike::CapturedError;

    fn finisher(stack: &str, skip: usize) -> (AsyncStackFinisher, RefCell<Vec<Marker>>) {
        let queue = RefCell::new(Vec::new());
        let mut finisher = prep_async_stack(skip, |marker| queue.borrow_mut().push(marker));
        finisher.stack = stack.to_owned();
        (finisher, queue)
    }

    fn error() -> CapturedError {
        CapturedError::from_stack("boom", "Error: boom\n    at a (a.js:1:1)\n")
    }

    #[test]
    fn test_synchronous_error_gets_nothing() {
        let (finisher, _queue) = finisher("Error\n    at x (x.js:1:1)\n", 0);
        let mut err = error();
        assert!(!finisher.finish(&mut err));
        assert_eq!(err.async_stack(), None);
    }

    #[test]
    fn test_asynchronous_error_gets_stack() {
        let (finisher, queue) = finisher(
            "Error\n    at helper (h.js:1:1)\n    at start (s.js:2:2)\n",
            1,
        );
        for marker in queue.into_inner() {
            marker();
        }

        let mut err = error();
        assert!(finisher.finish(&mut err));
        assert_eq!(err.async_stack(), Some("Error\n    at start (s.js:2:2)\n"));

        // an existing async stack is kept
        assert!(!finisher.finish(&mut err));
    }

    #[test]
    fn test_skip_beyond_stack() {
        let (finisher, queue) = finisher("Error\n    at a (a.js:1:1)", 10);
        queue.into_inner().into_iter().for_each(|marker| marker());

        let mut err = error();
        assert!(finisher.finish(&mut err));
        assert_eq!(err.async_stack(), Some("Error"));
    }
}
