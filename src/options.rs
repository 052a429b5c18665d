use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{de, Deserialize, Deserializer};

use crate::formatter::{formatter_by_name, DefaultFormatter, Formatter};
use crate::needles::NeedleResolver;
use crate::Error;

/// Indentation put in front of every rendered frame.
///
/// When loaded from configuration, a number or a string of digits is a
/// count of spaces and any other string is used literally.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "IndentValue")]
pub enum Indent {
    /// Indent by this many spaces.
    Spaces(usize),
    /// Indent with this literal text.
    Text(String),
}

impl Indent {
    /// The indentation as text.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Indent::Spaces(n) => Cow::Owned(" ".repeat(*n)),
            Indent::Text(text) => Cow::Borrowed(text),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndentValue {
    Spaces(usize),
    Text(String),
}

impl From<IndentValue> for Indent {
    fn from(value: IndentValue) -> Indent {
        match value {
            IndentValue::Spaces(n) => Indent::Spaces(n),
            IndentValue::Text(text) => {
                let digits = text.trim();
                match digits.parse() {
                    Ok(n) if digits.bytes().all(|b| b.is_ascii_digit()) => Indent::Spaces(n),
                    _ => Indent::Text(text),
                }
            }
        }
    }
}

impl Default for Indent {
    fn default() -> Indent {
        Indent::Spaces(4)
    }
}

/// Rendering and filtering options of a [`Trace`](crate::Trace).
///
/// The options are fixed for the lifetime of a trace.  They can be loaded
/// from JSON using the camel cased keys of the field names.
///
/// # Examples
///
/// ```
/// let options = traceable::TraceOptions::configure(|o| {
///     o.show_column_number = true;
///     o.blackbox = Some(vec!["express".into()]);
///     o
/// });
/// assert!(options.show_eval_origin);
/// ```
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceOptions {
    /// Show full file paths instead of shortened ones.
    pub show_full_path: bool,
    /// Show function names as reported instead of normalizing them.
    pub show_raw_function_name: bool,
    /// Append where evaluated code was created. (defaults to true)
    pub show_eval_origin: bool,
    /// Append the frames of asynchronous origins. (defaults to true)
    pub show_async_origin: bool,
    /// Show column numbers.
    pub show_column_number: bool,
    /// Indentation of every frame. (defaults to four spaces)
    pub indent: Indent,
    /// Path fragments whose frames are removed from traces.
    pub blackbox: Option<Vec<String>>,
    /// The formatter that renders frames and traces.
    #[serde(deserialize_with = "deserialize_formatter")]
    pub formatter: Arc<dyn Formatter>,
    /// Label for functions without a name, overriding the formatter's.
    pub anon_string: Option<String>,
    /// Resolver used to shorten paths and match the blackbox.
    #[serde(skip)]
    pub needles: Arc<NeedleResolver>,
}

impl TraceOptions {
    /// Creates new options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new options and immediately configures them.
    pub fn configure<F>(f: F) -> Self
    where
        F: FnOnce(&mut TraceOptions) -> &mut TraceOptions,
    {
        let mut opts = Self::new();
        f(&mut opts);
        opts
    }

    /// Loads options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// The label used for functions without a name.
    pub fn anon_string(&self) -> &str {
        match self.anon_string.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => self.formatter.anon_string(),
        }
    }

    /// Checks whether frames of `path` are filtered out.
    pub fn is_blackboxed(&self, path: &str) -> bool {
        match self.blackbox {
            Some(ref blackbox) => self.needles.is_blackboxed(path, blackbox),
            None => false,
        }
    }
}

impl Default for TraceOptions {
    fn default() -> TraceOptions {
        TraceOptions {
            show_full_path: false,
            show_raw_function_name: false,
            show_eval_origin: true,
            show_async_origin: true,
            show_column_number: false,
            indent: Indent::default(),
            blackbox: None,
            formatter: Arc::new(DefaultFormatter),
            anon_string: None,
            needles: NeedleResolver::global(),
        }
    }
}

impl fmt::Debug for TraceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceOptions")
            .field("show_full_path", &self.show_full_path)
            .field("show_raw_function_name", &self.show_raw_function_name)
            .field("show_eval_origin", &self.show_eval_origin)
            .field("show_async_origin", &self.show_async_origin)
            .field("show_column_number", &self.show_column_number)
            .field("indent", &self.indent)
            .field("blackbox", &self.blackbox)
            .field("formatter", &self.formatter)
            .field("anon_string", &self.anon_string)
            .finish()
    }
}

fn deserialize_formatter<'de, D>(deserializer: D) -> Result<Arc<dyn Formatter>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    formatter_by_name(&name).map_err(de::Error::custom)
}
