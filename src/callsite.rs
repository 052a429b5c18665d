use std::fmt;

use serde::Deserialize;

use crate::parse::{FrameSource, RawFrame};
use crate::Error;

/// Accessors of a structured call site as produced by a runtime.
///
/// This mirrors the call site objects handed out by V8's structured stack
/// trace API.  Implementors only expose what they know; all accessors that
/// return an `Option` may return `None`.
pub trait CallSite: fmt::Debug {
    /// The frame is a call into native code.
    fn is_native(&self) -> bool;
    /// The frame is a constructor invocation (`new Foo()`).
    fn is_constructor(&self) -> bool;
    /// The frame runs code created by `eval`.
    fn is_eval(&self) -> bool;
    /// The frame has a defined receiver.
    fn has_this(&self) -> bool;
    /// The type name of the receiver.
    fn type_name(&self) -> Option<&str>;
    /// The name of the called function.
    fn function_name(&self) -> Option<&str>;
    /// The script or file the function was defined in.
    fn file_name(&self) -> Option<&str>;
    /// One based line number.
    fn line_number(&self) -> Option<u32>;
    /// One based column number.
    fn column_number(&self) -> Option<u32>;
    /// Where the evaluated code was created, as a textual frame.
    fn eval_origin(&self) -> Option<&str>;

    /// The call site rendered the way the runtime prints it in a stack.
    fn raw_string(&self) -> String {
        Rendered(self).to_string()
    }
}

struct Rendered<'a, S: ?Sized>(&'a S);

impl<S: CallSite + ?Sized> fmt::Display for Rendered<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = self.0;
        let function = site.function_name().filter(|name| !name.is_empty());
        let type_name = site
            .type_name()
            .filter(|name| site.has_this() && !name.is_empty());

        if site.is_constructor() {
            write!(f, "new {} (", function.unwrap_or("<anonymous>"))?;
        } else {
            match (type_name, function) {
                (Some(ty), Some(func)) => write!(f, "{}.{} (", ty, func)?,
                (Some(ty), None) => write!(f, "{}.<anonymous> (", ty)?,
                (None, Some(func)) => write!(f, "{} (", func)?,
                (None, None) => return write_location(site, f),
            }
        }
        write_location(site, f)?;
        f.write_str(")")
    }
}

fn write_location<S: CallSite + ?Sized>(site: &S, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if site.is_native() {
        return f.write_str("native");
    }
    if let Some(origin) = site.eval_origin().filter(|_| site.is_eval()) {
        write!(f, "{}, ", origin)?;
    }
    f.write_str(site.file_name().unwrap_or("<anonymous>"))?;
    if let Some(line) = site.line_number() {
        write!(f, ":{}", line)?;
        if let Some(column) = site.column_number() {
            write!(f, ":{}", column)?;
        }
    }
    Ok(())
}

/// A call site described by plain data.
///
/// This is the shape structured stack traces take once they were exported
/// from a runtime, e.g. as JSON.  Keys are camel cased to match the runtime
/// accessor names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrameDescriptor {
    /// The call runs native code.
    pub is_native: bool,
    /// The call is a constructor invocation.
    pub is_constructor: bool,
    /// The call runs evaluated code.
    pub is_eval: bool,
    /// The call has a receiver.
    pub has_this: bool,
    /// The receiver's type name.
    pub type_name: Option<String>,
    /// The function name.
    pub function_name: Option<String>,
    /// The script path or URL.
    pub file_name: Option<String>,
    /// The 1-based line number.
    pub line_number: Option<u32>,
    /// The 1-based column number.
    pub column_number: Option<u32>,
    /// Where the evaluated code was created, in stack line form.
    pub eval_origin: Option<String>,
    /// Call sites recorded where the asynchronous operation was started.
    pub async_origin: Option<Vec<FrameDescriptor>>,
}

impl FrameDescriptor {
    /// Parses a JSON array of descriptors into raw frames.
    pub fn list_from_json(json: &str) -> Result<Vec<RawFrame>, Error> {
        let descriptors: Vec<FrameDescriptor> = serde_json::from_str(json)?;
        Ok(descriptors.into_iter().map(RawFrame::from).collect())
    }
}

impl CallSite for FrameDescriptor {
    fn is_native(&self) -> bool {
        self.is_native
    }

    fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    fn is_eval(&self) -> bool {
        self.is_eval
    }

    fn has_this(&self) -> bool {
        self.has_this
    }

    fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn line_number(&self) -> Option<u32> {
        self.line_number
    }

    fn column_number(&self) -> Option<u32> {
        self.column_number
    }

    fn eval_origin(&self) -> Option<&str> {
        self.eval_origin.as_deref()
    }
}

impl From<FrameDescriptor> for RawFrame {
    fn from(mut descriptor: FrameDescriptor) -> RawFrame {
        let async_origin = descriptor
            .async_origin
            .take()
            .map(|origin| origin.into_iter().map(RawFrame::from).collect());
        RawFrame {
            source: FrameSource::CallSite(Box::new(descriptor)),
            async_origin,
        }
    }
}
