use std::fmt;
use std::ops::Index;
use std::slice;
use std::sync::Arc;

use crate::capture::{capture_frames, capture_frames_below};
use crate::errorlike::ErrorLike;
use crate::formatter::RenderContext;
use crate::frame::Frame;
use crate::options::TraceOptions;
use crate::parse::{prep_raw_frames, RawFrame};

/// An ordered, filtered list of frames sharing one set of options.
///
/// Frames are kept in call order, innermost first.  Frames whose file
/// matches the configured blackbox are dropped; an asynchronous origin
/// attached to the innermost dropped tail moves to the last kept frame.
pub struct Trace {
    frames: Vec<Frame>,
    options: Arc<TraceOptions>,
}

impl Trace {
    /// Builds a trace from raw frames.
    pub fn new<O>(raw: Vec<RawFrame>, options: O) -> Trace
    where
        O: Into<Arc<TraceOptions>>,
    {
        let options = options.into();
        let mut frames = Vec::with_capacity(raw.len());
        let mut trailing_origin = None;

        for raw_frame in raw {
            let mut frame = Frame::new(raw_frame, options.clone());
            let blackboxed = frame
                .file_path()
                .map_or(false, |path| options.is_blackboxed(path));
            if blackboxed {
                traceable_debug!("dropping blackboxed frame {:?}", frame.raw_string());
                trailing_origin = frame.async_origin.take();
            } else {
                trailing_origin = None;
                frames.push(frame);
            }
        }

        if let Some(origin) = trailing_origin {
            match frames.last_mut() {
                Some(last) => last.async_origin = Some(origin),
                None => traceable_debug!("every frame was blackboxed, dropping async origin"),
            }
        }

        Trace { frames, options }
    }

    /// Parses a textual stack dump.
    ///
    /// The first line is the error message and the last line is not a
    /// frame; both are skipped.
    pub fn from_stack_str<O>(stack: &str, options: O) -> Trace
    where
        O: Into<Arc<TraceOptions>>,
    {
        Trace::new(prep_raw_frames(stack), options)
    }

    /// Parses the stack of an error, including its async stack.
    pub fn from_error<E, O>(error: &E, options: O) -> Trace
    where
        E: ErrorLike + ?Sized,
        O: Into<Arc<TraceOptions>>,
    {
        let mut frames = prep_raw_frames(error.stack().unwrap_or_default());
        if let Some(async_stack) = error.async_stack() {
            match frames.last_mut() {
                Some(last) => last.async_origin = Some(prep_raw_frames(async_stack)),
                None => traceable_debug!("error stack has no frames, ignoring async stack"),
            }
        }
        Trace::new(frames, options)
    }

    /// Captures the current call stack, skipping `skip` innermost frames
    /// of the caller.
    #[inline(never)]
    pub fn capture<O>(skip: usize, options: O) -> Trace
    where
        O: Into<Arc<TraceOptions>>,
    {
        Trace::new(capture_frames(skip), options)
    }

    /// Captures the current call stack below the innermost call of the
    /// function named `boundary`.
    ///
    /// The result is empty if no such call is on the stack.
    #[inline(never)]
    pub fn capture_below<O>(boundary: &str, options: O) -> Trace
    where
        O: Into<Arc<TraceOptions>>,
    {
        Trace::new(capture_frames_below(boundary), options)
    }

    /// The options the trace renders with.
    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// The kept frames, innermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Iterates over the kept frames.
    pub fn iter(&self) -> slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Returns the frame at `idx`.
    pub fn get(&self, idx: usize) -> Option<&Frame> {
        self.frames.get(idx)
    }

    /// The number of kept frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Checks whether no frame was kept.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Renders the trace through the configured formatter.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        self.options.formatter.format_trace(self, ctx)
    }
}

impl Index<usize> for Trace {
    type Output = Frame;

    fn index(&self, idx: usize) -> &Frame {
        &self.frames[idx]
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Frame;
    type IntoIter = slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderContext::new(&self.options)))
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.frames).finish()
    }
}
