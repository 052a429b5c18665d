use std::error::Error;
use std::fmt;

use crate::capture::capture_stack_text;

/// Helper trait for errors that carry a textual stack.
pub trait ErrorLike {
    /// The stack dump: a message line followed by one line per frame.
    fn stack(&self) -> Option<&str>;

    /// The stack captured where the failed asynchronous operation started.
    fn async_stack(&self) -> Option<&str> {
        None
    }

    /// Records the stack of the asynchronous origin.
    fn set_async_stack(&mut self, stack: String);
}

/// An error holding a captured stack dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    message: String,
    stack: String,
    async_stack: Option<String>,
}

impl CapturedError {
    /// Creates an error and captures the current stack.
    #[inline(never)]
    pub fn new<S: Into<String>>(message: S) -> CapturedError {
        let message = message.into();
        let stack = capture_stack_text(&format!("Error: {}", message));
        CapturedError::from_stack(message, stack)
    }

    /// Creates an error from a stack dump captured elsewhere.
    pub fn from_stack<M, S>(message: M, stack: S) -> CapturedError
    where
        M: Into<String>,
        S: Into<String>,
    {
        CapturedError {
            message: message.into(),
            stack: stack.into(),
            async_stack: None,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for CapturedError {}

impl ErrorLike for CapturedError {
    fn stack(&self) -> Option<&str> {
        Some(&self.stack)
    }

    fn async_stack(&self) -> Option<&str> {
        self.async_stack.as_deref()
    }

    fn set_async_stack(&mut self, stack: String) {
        self.async_stack = Some(stack);
    }
}
