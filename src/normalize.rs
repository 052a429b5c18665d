use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:
            ([^.\[(\s]+)            # outermost namespace
            (?:\.+([^.\[(\s]+))*    # innermost name
        )?
        (?:\s*\[as\s*([^\]]+)\])?   # alias the function was called as
        $
    ",
    )
    .unwrap()
});

/// The type name V8 reports for plain object literals.
const GENERIC_OBJECT_TYPE: &str = "Object";

/// Qualifier shown for functions that were most likely defined on an
/// object literal.
pub const ANONYMOUS_OBJECT: &str = "?";

/// Members reachable both on `Object` and on `Object.prototype`.
const OBJECT_PROTOTYPE_MEMBERS: &[&str] = &[
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "__proto__",
    "constructor",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toLocaleString",
    "toString",
    "valueOf",
];

/// A function name with redundant namespaces removed.
///
/// V8 reports functions of object literals and functions assigned elsewhere
/// with their full namespace (`$.extend.myFunction`) or with an alias
/// (`Class.method [as otherName]`).  Only the most specific name is kept, and
/// the outermost namespace becomes the qualifier when no type name is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedName {
    qualifier: String,
    name: String,
}

impl NormalizedName {
    /// Normalizes `function` as called on a receiver of type `type_name`.
    ///
    /// An empty `type_name` means the type is unknown.
    pub fn new(function: &str, type_name: &str) -> NormalizedName {
        let caps = FUNCTION_NAME_RE.captures(function);
        let group = |idx: usize| {
            caps.as_ref()
                .and_then(|caps| caps.get(idx))
                .map(|m| m.as_str())
        };

        let mut name = group(3).or_else(|| group(2)).or_else(|| group(1)).unwrap_or(function);
        if name == "<anonymous>" {
            name = "";
        }

        let mut qualifier = match type_name {
            "" if group(2).is_some() => group(1).unwrap_or_default(),
            other => other,
        };
        // Object literal methods show up as `Object.name`; only members of
        // `Object.prototype` keep the real type.
        if qualifier == GENERIC_OBJECT_TYPE && !OBJECT_PROTOTYPE_MEMBERS.contains(&name) {
            qualifier = ANONYMOUS_OBJECT;
        }

        NormalizedName {
            qualifier: qualifier.to_owned(),
            name: name.to_owned(),
        }
    }

    /// The qualifier, `?` for object literals, or empty.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// The bare function name, empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks whether no name could be determined.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.qualifier.is_empty() && !self.name.is_empty() {
            write!(f, "{}.", self.qualifier)?;
        }
        f.write_str(&self.name)
    }
}

/// Normalizes a raw function name into its display form.
///
/// Returns an empty string if no name can be determined.
pub fn normalize_function_name(function: &str, type_name: &str) -> String {
    NormalizedName::new(function, type_name).to_string()
}
