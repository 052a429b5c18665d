use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::formatter::RenderContext;
use crate::normalize::normalize_function_name;
use crate::options::TraceOptions;
use crate::parse::{parse_frame_line, FrameFields, RawFrame};
use crate::trace::Trace;

/// One entry of a call stack.
///
/// The captured fields never change after construction.  Derived values
/// (function name, eval origin, source and rendered line) are computed on
/// first access and then kept.
pub struct Frame {
    fields: FrameFields,
    file_name: Option<String>,
    pub(crate) async_origin: Option<Trace>,
    options: Arc<TraceOptions>,
    function_name: OnceCell<String>,
    eval_origin: OnceCell<Option<Box<Frame>>>,
    source: OnceCell<String>,
    rendered: OnceCell<(usize, String)>,
}

impl Frame {
    /// Parses a raw frame.
    ///
    /// An asynchronous origin attached to the raw frame becomes a nested
    /// [`Trace`] sharing the same options.
    pub fn new(raw: RawFrame, options: Arc<TraceOptions>) -> Frame {
        let fields = FrameFields::from_source(&raw.source);
        let async_origin = raw
            .async_origin
            .map(|frames| Trace::new(frames, options.clone()));
        Frame::from_fields(fields, async_origin, options)
    }

    /// Parses one line of a stack dump.
    pub fn from_line(line: &str, options: Arc<TraceOptions>) -> Frame {
        Frame::from_fields(parse_frame_line(line), None, options)
    }

    fn from_fields(
        fields: FrameFields,
        async_origin: Option<Trace>,
        options: Arc<TraceOptions>,
    ) -> Frame {
        let file_name = fields.file_path.as_deref().map(|path| {
            if options.show_full_path {
                return path.to_owned();
            }
            options
                .needles
                .short_name(path)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| path.to_owned())
        });
        Frame {
            fields,
            file_name,
            async_origin,
            options,
            function_name: OnceCell::new(),
            eval_origin: OnceCell::new(),
            source: OnceCell::new(),
            rendered: OnceCell::new(),
        }
    }

    /// The frame as it was captured.
    pub fn raw_string(&self) -> &str {
        &self.fields.raw_string
    }

    /// Checks whether the raw frame could be parsed.
    ///
    /// Unparsed frames carry nothing but their raw string and render as it.
    pub fn is_parsed(&self) -> bool {
        self.fields.parsed
    }

    /// Checks whether this is a call into native code.
    pub fn is_native(&self) -> bool {
        self.fields.native
    }

    /// Checks whether this is a constructor invocation.
    pub fn is_constructor(&self) -> bool {
        self.fields.is_constructor
    }

    /// The receiver's type name; empty if unknown.
    pub fn type_name(&self) -> &str {
        &self.fields.type_name
    }

    /// The function name as captured.
    pub fn raw_function_name(&self) -> &str {
        &self.fields.raw_function_name
    }

    /// The file path as captured.
    pub fn file_path(&self) -> Option<&str> {
        self.fields.file_path.as_deref()
    }

    /// The file path for display, shortened unless full paths are shown.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The line number.
    pub fn line_number(&self) -> Option<u64> {
        self.fields.line_number
    }

    /// The column number.
    pub fn column_number(&self) -> Option<u64> {
        self.fields.column_number
    }

    /// The options this frame renders with.
    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// The trace of the asynchronous origin, if one was captured.
    pub fn async_origin(&self) -> Option<&Trace> {
        self.async_origin.as_ref()
    }

    /// The frame that created the evaluated code this frame runs.
    ///
    /// The origin is parsed from its textual form on first access.
    pub fn eval_origin(&self) -> Option<&Frame> {
        self.eval_origin
            .get_or_init(|| {
                self.fields
                    .eval_origin
                    .as_deref()
                    .map(|line| Box::new(Frame::from_line(line, self.options.clone())))
            })
            .as_deref()
    }

    /// The display name of the called function.
    ///
    /// Unless raw names are requested the name is normalized; anonymous
    /// functions get the configured placeholder.  Constructor calls are
    /// prefixed with `new `.
    pub fn function_name(&self) -> &str {
        self.function_name.get_or_init(|| {
            if !self.fields.parsed {
                return String::new();
            }

            let type_name = &self.fields.type_name;
            let raw_name = &self.fields.raw_function_name;
            let name = if self.options.show_raw_function_name {
                if type_name.is_empty() {
                    raw_name.clone()
                } else {
                    format!("{}.{}", type_name, raw_name)
                }
            } else {
                match normalize_function_name(raw_name, type_name) {
                    name if name.is_empty() => self.options.anon_string().to_owned(),
                    name => name,
                }
            };

            if self.fields.is_constructor {
                format!("new {}", name)
            } else {
                name
            }
        })
    }

    /// The rendered location, including the eval origin if enabled.
    pub fn source(&self) -> &str {
        self.source.get_or_init(|| {
            if !self.fields.parsed {
                return self.fields.raw_string.trim().to_owned();
            }

            let formatter = &self.options.formatter;
            let mut source = formatter.format_source(self, &self.options);
            if self.options.show_eval_origin {
                if let Some(origin) = self.eval_origin() {
                    source.push_str(&formatter.format_eval_origin(origin, &self.options));
                }
            }
            source
        })
    }

    /// Renders the frame as one indented line, followed by its async origin
    /// if enabled.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        if let Some((width, line)) = self.rendered.get() {
            if *width == ctx.name_width {
                return line.clone();
            }
        }

        let line = self.render_uncached(ctx);
        // the first rendering wins the cache; other widths are recomputed
        let _ = self.rendered.set((ctx.name_width, line.clone()));
        line
    }

    fn render_uncached(&self, ctx: &RenderContext<'_>) -> String {
        if !self.fields.parsed {
            return self.fields.raw_string.clone();
        }

        let formatter = &self.options.formatter;
        let mut line = format!(
            "{}{}",
            self.options.indent.as_str(),
            formatter.format_frame(self, ctx)
        );
        if self.options.show_async_origin {
            if let Some(origin) = &self.async_origin {
                line.push_str(&formatter.format_async_origin(origin, ctx));
            }
        }
        line
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderContext::new(&self.options)))
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("raw_string", &self.fields.raw_string)
            .field("native", &self.fields.native)
            .field("is_constructor", &self.fields.is_constructor)
            .field("type_name", &self.fields.type_name)
            .field("raw_function_name", &self.fields.raw_function_name)
            .field("file_path", &self.fields.file_path)
            .field("line_number", &self.fields.line_number)
            .field("column_number", &self.fields.column_number)
            .field("eval_origin", &self.fields.eval_origin)
            .field("async_origin", &self.async_origin)
            .finish()
    }
}
