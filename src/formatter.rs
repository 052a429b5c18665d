//! Pluggable rendering of frames and traces.
//!
//! A [`Formatter`] supplies the textual rules used when a [`Frame`] or a
//! [`Trace`] is turned into a string.  The provided methods implement the
//! plain V8 layout; implementors override what they want to change.

use std::fmt;
use std::sync::Arc;

use crate::frame::Frame;
use crate::options::TraceOptions;
use crate::trace::Trace;
use crate::Error;

/// State shared by all formatter calls of one rendering pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The options of the trace being rendered.
    pub options: &'a TraceOptions,
    /// Width function names are padded to.
    pub name_width: usize,
}

impl<'a> RenderContext<'a> {
    /// Creates a context for the given options without padding.
    pub fn new(options: &'a TraceOptions) -> RenderContext<'a> {
        RenderContext {
            options,
            name_width: 0,
        }
    }

    /// Returns a context padding function names to at least `width`.
    pub fn with_name_width(self, width: usize) -> RenderContext<'a> {
        RenderContext {
            name_width: self.name_width.max(width),
            ..self
        }
    }
}

/// Textual rendering rules for frames and traces.
pub trait Formatter: fmt::Debug + Send + Sync {
    /// Label used for functions without a name.
    fn anon_string(&self) -> &str {
        ""
    }

    /// Renders a whole trace.
    fn format_trace(&self, trace: &Trace, ctx: &RenderContext<'_>) -> String {
        join_frames(trace, ctx)
    }

    /// Renders one frame, without indentation and async origin.
    fn format_frame(&self, frame: &Frame, _ctx: &RenderContext<'_>) -> String {
        let name = frame.function_name();
        if name.is_empty() {
            format!("at {}", frame.source())
        } else {
            format!("at {} ({})", name, frame.source())
        }
    }

    /// Renders the location of a frame.
    fn format_source(&self, frame: &Frame, options: &TraceOptions) -> String {
        if frame.is_native() {
            return "native".into();
        }
        let mut source = frame.file_name().unwrap_or_default().to_owned();
        if let Some(line) = frame.line_number() {
            source.push_str(&format!(":{}", line));
            if let Some(column) = frame.column_number().filter(|_| options.show_column_number) {
                source.push_str(&format!(":{}", column));
            }
        }
        source
    }

    /// Renders the suffix describing where evaluated code was created.
    fn format_eval_origin(&self, origin: &Frame, _options: &TraceOptions) -> String {
        format!(" eval at {}", origin.source())
    }

    /// Renders the block appended to a frame with an asynchronous origin.
    fn format_async_origin(&self, origin: &Trace, ctx: &RenderContext<'_>) -> String {
        format!(
            "\n{}[async]\n{}",
            ctx.options.indent.as_str(),
            origin.render(ctx)
        )
    }
}

/// Renders every frame of a trace on its own line.
pub fn join_frames(trace: &Trace, ctx: &RenderContext<'_>) -> String {
    trace
        .iter()
        .map(|frame| frame.render(ctx))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders frames the way V8 prints them: `at name (file:line)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFormatter;

impl Formatter for NativeFormatter {}

/// Renders frames in aligned columns: `name @ file:line`.
///
/// Function names are padded to the longest name of the trace, including
/// the frames of all asynchronous origins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn anon_string(&self) -> &str {
        "(anonymous function)"
    }

    fn format_trace(&self, trace: &Trace, ctx: &RenderContext<'_>) -> String {
        join_frames(trace, &ctx.with_name_width(max_name_width(trace)))
    }

    fn format_frame(&self, frame: &Frame, ctx: &RenderContext<'_>) -> String {
        let name = frame.function_name();
        let padding = ctx.name_width.saturating_sub(name.chars().count());
        format!(
            "{}{} @ {}",
            name,
            " ".repeat(padding),
            frame.source().replace('\\', "/")
        )
    }
}

fn max_name_width(trace: &Trace) -> usize {
    trace
        .iter()
        .map(|frame| {
            let own = frame.function_name().chars().count();
            match frame.async_origin() {
                Some(origin) => own.max(max_name_width(origin)),
                None => own,
            }
        })
        .max()
        .unwrap_or(0)
}

/// Looks up one of the provided formatters by name.
///
/// `default` and `aligned` select [`DefaultFormatter`], `native` and `plain`
/// select [`NativeFormatter`].
pub fn formatter_by_name(name: &str) -> Result<Arc<dyn Formatter>, Error> {
    match name {
        "default" | "aligned" => Ok(Arc::new(DefaultFormatter)),
        "native" | "plain" => Ok(Arc::new(NativeFormatter)),
        other => Err(Error::UnknownFormatter(other.to_owned())),
    }
}
