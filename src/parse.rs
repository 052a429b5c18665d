use std::num::ParseIntError;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::callsite::CallSite;

static FRAME_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:eval[\ ]|\s*)?  # leading indentation or eval marker
        at[\ ]
        (.*)                # call target and location
        $
    ",
    )
    .unwrap()
});

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:
            native
            | null
            | (?:(.+),[\ ])?    # eval origin
            (.+?)               # file
            :(\d+)              # line
            (?::(\d+))?         # column
        )
        \)?
        $
    ",
    )
    .unwrap()
});

/// A frame that has been recorded but not parsed yet.
#[derive(Debug)]
pub struct RawFrame {
    /// Where the frame information comes from.
    pub source: FrameSource,
    /// Frames recorded where the asynchronous operation leading to this
    /// frame was started.
    pub async_origin: Option<Vec<RawFrame>>,
}

/// The two accepted shapes of raw frame information.
#[derive(Debug)]
pub enum FrameSource {
    /// One line of a textual stack dump.
    Text(String),
    /// A structured call site.
    CallSite(Box<dyn CallSite>),
}

impl RawFrame {
    /// Creates a raw frame from one line of a stack dump.
    pub fn text<S: Into<String>>(line: S) -> RawFrame {
        RawFrame {
            source: FrameSource::Text(line.into()),
            async_origin: None,
        }
    }

    /// Creates a raw frame from a structured call site.
    pub fn call_site<C: CallSite + 'static>(site: C) -> RawFrame {
        RawFrame {
            source: FrameSource::CallSite(Box::new(site)),
            async_origin: None,
        }
    }

    /// Attaches the frames of an asynchronous origin.
    pub fn with_async_origin(mut self, frames: Vec<RawFrame>) -> RawFrame {
        self.async_origin = Some(frames);
        self
    }
}

/// Splits a stack dump into raw frames.
///
/// The first line (the error message) and the last line are not frames and
/// are discarded.
pub fn prep_raw_frames(stack: &str) -> Vec<RawFrame> {
    let lines: Vec<&str> = stack.split('\n').collect();
    if lines.len() <= 2 {
        return Vec::new();
    }
    lines[1..lines.len() - 1]
        .iter()
        .map(|line| RawFrame::text(line.trim_end_matches('\r')))
        .collect()
}

/// The fields captured from one raw frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FrameFields {
    pub raw_string: String,
    pub parsed: bool,
    pub native: bool,
    pub is_constructor: bool,
    pub type_name: String,
    pub raw_function_name: String,
    pub file_path: Option<String>,
    pub line_number: Option<u64>,
    pub column_number: Option<u64>,
    pub eval_origin: Option<String>,
}

impl FrameFields {
    pub fn from_source(source: &FrameSource) -> FrameFields {
        match source {
            FrameSource::Text(line) => parse_frame_line(line),
            FrameSource::CallSite(site) => from_call_site(site.as_ref()),
        }
    }
}

/// Parses one line of a textual stack dump.
///
/// Lines that are not recognized produce unparsed fields holding only the
/// raw line.
pub(crate) fn parse_frame_line(line: &str) -> FrameFields {
    let unparsed = || FrameFields {
        raw_string: line.to_owned(),
        ..Default::default()
    };

    let rest = match FRAME_PREFIX_RE.captures(line).and_then(|caps| caps.get(1)) {
        Some(rest) => rest.as_str(),
        None => {
            traceable_debug!("unrecognized stack line {:?}", line);
            return unparsed();
        }
    };

    let Some((is_constructor, name, location)) = split_call_target(rest) else {
        traceable_debug!("unrecognized stack line {:?}", line);
        return unparsed();
    };

    let (type_name, raw_function_name) = match name.find('.') {
        Some(0) => ("", &name[1..]),
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    };

    let group = |idx: usize| location.get(idx).map(|m| m.as_str());
    let (line_number, column_number) = match (parse_position(group(3)), parse_position(group(4))) {
        (Ok(line_number), Ok(column_number)) => (line_number, column_number),
        _ => {
            traceable_debug!("position out of range in stack line {:?}", line);
            return unparsed();
        }
    };
    let file_path = group(2).map(str::to_owned);
    FrameFields {
        raw_string: line.to_owned(),
        parsed: true,
        native: file_path.is_none(),
        is_constructor,
        type_name: type_name.to_owned(),
        raw_function_name: raw_function_name.to_owned(),
        file_path,
        line_number,
        column_number,
        eval_origin: group(1).filter(|s| !s.is_empty()).map(str::to_owned),
    }
}

/// Splits `[new ]<name> (<location>)` or `<location>`.
///
/// The name is the longest candidate that does not swallow an
/// `(eval at ` marker and leaves a valid location behind.
fn split_call_target(rest: &str) -> Option<(bool, &str, regex::Captures<'_>)> {
    let mut targets = Vec::with_capacity(2);
    if let Some(stripped) = rest.strip_prefix("new ") {
        targets.push((true, stripped));
    }
    targets.push((false, rest));

    for (is_constructor, target) in targets {
        let splits = target.rmatch_indices(" (").map(|(idx, _)| idx);
        for idx in splits {
            let name = &target[..idx];
            if name.is_empty() || name.contains("(eval at ") {
                continue;
            }
            if let Some(location) = LOCATION_RE.captures(&target[idx + 2..]) {
                return Some((is_constructor, name, location));
            }
        }
    }

    LOCATION_RE
        .captures(rest)
        .map(|location| (false, "", location))
}

/// Parses a line or column; `0` counts as absent.
fn parse_position(digits: Option<&str>) -> Result<Option<u64>, ParseIntError> {
    match digits {
        Some(digits) => Ok(Some(digits.parse::<u64>()?).filter(|n| *n != 0)),
        None => Ok(None),
    }
}

fn from_call_site(site: &dyn CallSite) -> FrameFields {
    let native = site.is_native();
    let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_owned);
    FrameFields {
        raw_string: site.raw_string(),
        parsed: true,
        native,
        is_constructor: site.is_constructor(),
        type_name: if site.has_this() {
            non_empty(site.type_name()).unwrap_or_default()
        } else {
            String::new()
        },
        raw_function_name: non_empty(site.function_name()).unwrap_or_default(),
        file_path: if native {
            None
        } else {
            Some(non_empty(site.file_name()).unwrap_or_else(|| "<anonymous>".into()))
        },
        line_number: site.line_number().filter(|n| *n != 0).map(u64::from),
        column_number: site.column_number().filter(|n| *n != 0).map(u64::from),
        eval_origin: if site.is_eval() {
            non_empty(site.eval_origin())
        } else {
            None
        },
    }
}
