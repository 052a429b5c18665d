use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static HASH_FUNC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        ^(.*)::h[a-f0-9]{16}$
    "#,
    )
    .unwrap()
});

static CRATE_HASH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        \b(\[[a-f0-9]{16}\])
    ",
    )
    .unwrap()
});

/// Removes the trailing hash and crate disambiguators from a symbol.
pub fn strip_symbol(s: &str) -> Cow<'_, str> {
    let stripped_trailing_hash = HASH_FUNC_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .map_or(s, |m| m.as_str());

    CRATE_HASH_RE.replace_all(stripped_trailing_hash, "")
}

/// Turns a rust path (`a::b::c`) into the dotted form used by stack lines.
pub fn dotted_path(s: &str) -> String {
    s.replace("::", ".")
}

/// Checks whether the function name starts with the given pattern.
///
/// Impl blocks show up as `<a::B>::c` or `_<a..B>::c` depending on the
/// mangling scheme; angle brackets are ignored and `.` matches `:`.
pub fn function_starts_with(func_name: &str, pattern: &str) -> bool {
    let func_name = func_name
        .strip_prefix('_')
        .filter(|rest| rest.starts_with('<'))
        .unwrap_or(func_name);
    let without_brackets = |s: &str| -> Vec<char> {
        s.chars().filter(|c| !matches!(c, '<' | '>')).collect()
    };
    let func_name = without_brackets(func_name);
    let pattern = without_brackets(pattern);

    func_name.len() >= pattern.len()
        && func_name
            .iter()
            .zip(pattern.iter())
            .all(|(f, p)| f == p || *f == '.' && *p == ':')
}
