//! This crate parses and normalizes V8 style stack traces.
//!
//! Stacks come in as the text a JavaScript runtime prints for an error, as
//! structured call sites, or are captured live from the current thread.  They
//! are parsed into [`Frame`]s, filtered through a path blackbox and rendered
//! back into text by a pluggable [`Formatter`].
//!
//! # Quickstart
//!
//! ```
//! use traceable::{Trace, TraceOptions};
//!
//! let stack = "Error: boom
//!     at Object.doStuff (/srv/app/lib/stuff.js:12:34)
//!     at new Server (/srv/app/server.js:3:5)
//! ";
//! let trace = Trace::from_stack_str(stack, TraceOptions::default());
//! assert_eq!(trace.len(), 2);
//! assert_eq!(trace[0].function_name(), "?.doStuff");
//! assert_eq!(trace[1].function_name(), "new Server");
//! ```
//!
//! Rendering uses the aligned [`DefaultFormatter`] unless another formatter is
//! configured.  The [`NativeFormatter`] reproduces the layout of the runtime:
//!
//! ```
//! use std::sync::Arc;
//! use traceable::{NativeFormatter, Trace, TraceOptions};
//!
//! let options = TraceOptions::configure(|o| {
//!     o.formatter = Arc::new(NativeFormatter);
//!     o.show_full_path = true;
//!     o.show_column_number = true;
//!     o
//! });
//! let trace = Trace::from_stack_str("Error\n    at run (/a.js:1:2)\n", options);
//! assert_eq!(trace.to_string(), "    at run (/a.js:1:2)");
//! ```
//!
//! # Asynchronous origins
//!
//! An error raised after an asynchronous boundary only carries the frames of
//! the event loop.  [`prep_async_stack`] records the stack where the operation
//! started; the recorded stack is attached to the error and shows up below the
//! last frame in an `[async]` block.
//!
//! # Logging
//!
//! The crate logs internal decisions (dropped frames, missing capture
//! boundaries) at debug level to the `traceable` target of the `log` crate.
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod async_stack;
mod callsite;
mod capture;
mod error;
mod errorlike;
mod formatter;
mod frame;
mod needles;
mod normalize;
mod options;
mod parse;
mod trace;
mod utils;

#[cfg(feature = "tokio")]
pub use crate::async_stack::prep_async_stack_tokio;
pub use crate::async_stack::{prep_async_stack, AsyncStackFinisher, Marker};
pub use crate::callsite::{CallSite, FrameDescriptor};
pub use crate::capture::{capture_frames, capture_frames_below, capture_stack_text, BacktraceCallSite};
pub use crate::error::Error;
pub use crate::errorlike::{CapturedError, ErrorLike};
pub use crate::formatter::{
    formatter_by_name, join_frames, DefaultFormatter, Formatter, NativeFormatter, RenderContext,
};
pub use crate::frame::Frame;
pub use crate::needles::{NeedleResolver, Needles};
pub use crate::normalize::{normalize_function_name, NormalizedName, ANONYMOUS_OBJECT};
pub use crate::options::{Indent, TraceOptions};
pub use crate::parse::{prep_raw_frames, FrameSource, RawFrame};
pub use crate::trace::Trace;

/// Parses the stack of an error with default options.
pub fn trace_error<E: ErrorLike + ?Sized>(error: &E) -> Trace {
    Trace::from_error(error, TraceOptions::default())
}

/// Parses a textual stack dump with default options.
pub fn trace_str(stack: &str) -> Trace {
    Trace::from_stack_str(stack, TraceOptions::default())
}

/// Captures the stack of the caller with default options.
#[inline(never)]
pub fn trace_here(skip: usize) -> Trace {
    Trace::new(capture_frames(skip), TraceOptions::default())
}
