use thiserror::Error;

/// Errors raised while loading options or frame descriptors.
///
/// Parsing stack text itself never fails; malformed lines degrade to
/// unparsed frames instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The input was not valid JSON or did not have the expected shape.
    #[error("invalid json input")]
    Json(#[from] serde_json::Error),
    /// A formatter was requested by a name that is not known.
    #[error("unknown formatter `{0}`")]
    UnknownFormatter(String),
}
