//! Capturing the live call stack of the current thread.

use backtrace::Backtrace;

use crate::callsite::CallSite;
use crate::parse::RawFrame;
use crate::utils::{dotted_path, function_starts_with, strip_symbol};

/// Functions that only exist to capture a stack and never belong in one.
const CAPTURE_FRAMES: &[&str] = &[
    "backtrace::",
    "traceable::capture::current_call_sites",
    "traceable::capture::capture_frames",
    "traceable::capture::capture_stack_text",
    "traceable::trace::Trace::capture",
    "traceable::trace_here",
    "traceable::async_stack::prep_async_stack",
    "traceable::errorlike::CapturedError::new",
];

/// A call site resolved from a native backtrace symbol.
///
/// Rust paths are reported in dotted form (`app.server.listen`) so function
/// names normalize like those of script frames.  Symbols without a file are
/// treated as native code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacktraceCallSite {
    symbol: Option<String>,
    function: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
}

impl BacktraceCallSite {
    /// The symbol name with hashes removed, in rust path form.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    fn is_capture_frame(&self) -> bool {
        self.symbol.as_deref().map_or(false, |symbol| {
            CAPTURE_FRAMES
                .iter()
                .any(|pattern| function_starts_with(symbol, pattern))
        })
    }
}

impl CallSite for BacktraceCallSite {
    fn is_native(&self) -> bool {
        self.file.is_none()
    }

    fn is_constructor(&self) -> bool {
        false
    }

    fn is_eval(&self) -> bool {
        false
    }

    fn has_this(&self) -> bool {
        false
    }

    fn type_name(&self) -> Option<&str> {
        None
    }

    fn function_name(&self) -> Option<&str> {
        self.function.as_deref()
    }

    fn file_name(&self) -> Option<&str> {
        self.file.as_deref()
    }

    fn line_number(&self) -> Option<u32> {
        self.line
    }

    fn column_number(&self) -> Option<u32> {
        self.column
    }

    fn eval_origin(&self) -> Option<&str> {
        None
    }
}

#[inline(never)]
fn current_call_sites() -> Vec<BacktraceCallSite> {
    let bt = Backtrace::new();
    let sites: Vec<BacktraceCallSite> = bt
        .frames()
        .iter()
        .flat_map(|frame| {
            frame.symbols().iter().map(|sym| {
                let symbol = sym.name().map(|name| strip_symbol(&name.to_string()).into_owned());
                BacktraceCallSite {
                    function: symbol.as_deref().map(dotted_path),
                    symbol,
                    file: sym.filename().map(|path| path.to_string_lossy().into_owned()),
                    line: sym.lineno(),
                    column: sym.colno(),
                }
            })
        })
        .collect();
    strip_capture_frames(sites)
}

/// Drops everything up to and including the capture machinery.
fn strip_capture_frames(sites: Vec<BacktraceCallSite>) -> Vec<BacktraceCallSite> {
    let start = match sites.iter().position(BacktraceCallSite::is_capture_frame) {
        Some(start) => start,
        None => return sites,
    };
    let end = sites[start..]
        .iter()
        .position(|site| !site.is_capture_frame())
        .map_or(sites.len(), |offset| start + offset);
    sites.into_iter().skip(end).collect()
}

/// Captures the current stack, skipping `skip` frames of the caller.
#[inline(never)]
pub fn capture_frames(skip: usize) -> Vec<RawFrame> {
    current_call_sites()
        .into_iter()
        .skip(skip)
        .map(RawFrame::call_site)
        .collect()
}

/// Captures the current stack below the innermost call of `boundary`.
///
/// `boundary` is a rust path prefix such as `app::server::listen`.  If no
/// frame matches, nothing is returned.
#[inline(never)]
pub fn capture_frames_below(boundary: &str) -> Vec<RawFrame> {
    let sites = current_call_sites();
    let found = sites.iter().position(|site| {
        site.symbol()
            .map_or(false, |symbol| function_starts_with(symbol, boundary))
    });
    match found {
        Some(idx) => sites
            .into_iter()
            .skip(idx + 1)
            .map(RawFrame::call_site)
            .collect(),
        None => {
            traceable_debug!("capture boundary {:?} is not on the stack", boundary);
            Vec::new()
        }
    }
}

/// Captures the current stack as V8 style text.
///
/// The text starts with `header` and ends with a newline, so it can be fed
/// back into [`Trace::from_stack_str`](crate::Trace::from_stack_str).
#[inline(never)]
pub fn capture_stack_text(header: &str) -> String {
    let mut text = format!("{}\n", header);
    for site in current_call_sites() {
        text.push_str("    at ");
        text.push_str(&site.raw_string());
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Trace, TraceOptions};

    fn site(symbol: &str) -> BacktraceCallSite {
        BacktraceCallSite {
            symbol: Some(symbol.into()),
            function: Some(dotted_path(symbol)),
            file: Some("/srv/app/src/main.rs".into()),
            line: Some(1),
            column: None,
        }
    }

    #[test]
    fn test_strip_capture_frames() {
        let sites = vec![
            site("_Unwind_Backtrace"),
            site("backtrace::capture::Backtrace::new"),
            site("traceable::capture::current_call_sites"),
            site("<traceable::trace::Trace>::capture::<traceable::options::TraceOptions>"),
            site("app::main"),
            site("std::rt::lang_start"),
        ];
        let stripped = strip_capture_frames(sites);
        let symbols: Vec<_> = stripped.iter().filter_map(BacktraceCallSite::symbol).collect();
        assert_eq!(symbols, ["app::main", "std::rt::lang_start"]);

        let untouched = strip_capture_frames(vec![site("app::main")]);
        assert_eq!(untouched.len(), 1);
    }

    #[test]
    fn test_call_site_rendering() {
        let site = site("app::server::listen");
        assert_eq!(site.raw_string(), "app.server.listen (/srv/app/src/main.rs:1)");

        let native = BacktraceCallSite {
            file: None,
            ..site
        };
        assert!(native.is_native());
        assert_eq!(native.raw_string(), "app.server.listen (native)");
    }

    #[test]
    fn test_capture_skips_machinery() {
        let trace = Trace::new(capture_frames(0), TraceOptions::default());
        assert!(trace
            .iter()
            .all(|frame| !frame.raw_function_name().contains("current_call_sites")));
    }

    #[inline(never)]
    fn outer_boundary() -> Vec<RawFrame> {
        inner_capture()
    }

    #[inline(never)]
    fn inner_capture() -> Vec<RawFrame> {
        capture_frames_below("traceable::capture::tests::outer_boundary")
    }

    #[test]
    fn test_capture_below() {
        let trace = Trace::new(outer_boundary(), TraceOptions::default());
        assert!(trace.iter().all(|frame| {
            let name = frame.raw_function_name();
            !name.contains("inner_capture") && !name.contains("outer_boundary")
        }));

        assert!(capture_frames_below("no::such::function").is_empty());
    }

    #[test]
    fn test_capture_stack_text() {
        let text = capture_stack_text("Error: boom");
        assert!(text.starts_with("Error: boom\n"));
        assert!(text.ends_with('\n'));
        assert!(!text.contains("capture.current_call_sites"));
    }
}
