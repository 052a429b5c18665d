//! Path shortening and blackbox matching.
//!
//! A file path is turned into a list of "needles": the path relative to a
//! package or a known root, followed by each of its shorter prefixes.  The
//! first needle is used as the display name of a file, and any needle can be
//! matched against a blackbox list.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

/// Directory name that marks the start of a vendored package.
const PACKAGE_MARKER: &str = "node_modules";

/// An ordered needle set, most specific entry first.
pub type Needles = Arc<[String]>;

static GLOBAL_RESOLVER: Lazy<Arc<NeedleResolver>> =
    Lazy::new(|| Arc::new(NeedleResolver::from_env()));

/// Computes and memoizes needle sets per file path.
///
/// Results are cached for the lifetime of the resolver.  The cache is only
/// ever filled with values that are a pure function of the path and the
/// configured roots, so concurrent fills of the same key are harmless.
#[derive(Debug)]
pub struct NeedleResolver {
    roots: Vec<PathBuf>,
    base: Option<PathBuf>,
    cache: Mutex<HashMap<String, Needles>>,
}

impl NeedleResolver {
    /// Returns the process wide resolver built by [`NeedleResolver::from_env`].
    pub fn global() -> Arc<NeedleResolver> {
        GLOBAL_RESOLVER.clone()
    }

    /// Creates a resolver whose known roots are the `NODE_PATH` entries, the
    /// working directory and the directory of the running executable.
    pub fn from_env() -> Self {
        let mut roots: Vec<PathBuf> = env::var_os("NODE_PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();
        roots.extend(env::current_dir().ok());
        roots.extend(
            env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
        );
        Self::with_roots(roots)
    }

    /// Creates a resolver with an explicit list of known roots.
    ///
    /// Roots are tried longest first so the most specific one wins.
    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut roots: Vec<PathBuf> = roots
            .into_iter()
            .map(Into::into)
            .filter(|root| !root.as_os_str().is_empty())
            .collect();
        roots.sort_by_key(|root| Reverse(root.as_os_str().len()));
        NeedleResolver {
            roots,
            base: env::current_dir().ok(),
            cache: Mutex::default(),
        }
    }

    /// Returns the needle set for a file path, computing it on first use.
    pub fn needles(&self, path: &str) -> Needles {
        if let Some(hit) = self.lock_cache().get(path) {
            return hit.clone();
        }

        let computed: Needles = self.compute(path).into();
        traceable_debug!("computed {} needle(s) for {:?}", computed.len(), path);
        self.lock_cache()
            .entry(path.to_owned())
            .or_insert(computed)
            .clone()
    }

    /// Returns the shortest discriminating display name for a path, if any.
    pub fn short_name(&self, path: &str) -> Option<String> {
        self.needles(path).first().cloned()
    }

    /// Checks whether any needle of the path is listed in `blackbox`.
    pub fn is_blackboxed(&self, path: &str, blackbox: &[String]) -> bool {
        self.needles(path)
            .iter()
            .any(|needle| blackbox.iter().any(|entry| entry == needle))
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Needles>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn compute(&self, path: &str) -> Vec<String> {
        if path.is_empty() {
            return Vec::new();
        }

        let segments: Vec<&str> = path.split(MAIN_SEPARATOR).collect();
        if segments.len() == 1 {
            return vec![path.to_owned()];
        }
        if let Some(idx) = segments.iter().rposition(|s| *s == PACKAGE_MARKER) {
            return splat(&segments[idx + 1..]);
        }
        match self.relative_to_root(path) {
            Some(rel) => splat(&rel.split(MAIN_SEPARATOR).collect::<Vec<_>>()),
            None => Vec::new(),
        }
    }

    fn relative_to_root(&self, path: &str) -> Option<String> {
        let path = Path::new(path);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.as_ref()?.join(path)
        };

        // the most specific root decides, even when nothing is left of the path
        let rel = self
            .roots
            .iter()
            .find_map(|root| absolute.strip_prefix(root).ok())?
            .to_str()?;
        if rel.is_empty() {
            None
        } else {
            Some(rel.to_owned())
        }
    }
}

/// Expands `[a, b, c]` into `["a/b/c", "a/b", "a"]`.
fn splat(segments: &[&str]) -> Vec<String> {
    let mut needles: Vec<String> = Vec::with_capacity(segments.len());
    for segment in segments {
        let needle = match needles.last() {
            Some(prev) if !prev.is_empty() => format!("{}/{}", prev, segment),
            _ => (*segment).to_owned(),
        };
        needles.push(needle);
    }
    needles.reverse();
    needles
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn resolver() -> NeedleResolver {
        NeedleResolver::with_roots(["/srv", "/srv/app", "/opt/lib"])
    }

    #[test]
    fn test_package_needles() {
        let needles = resolver().needles("/srv/app/node_modules/pkg/lib/index.js");
        assert_eq!(
            &needles[..],
            &["pkg/lib/index.js", "pkg/lib", "pkg"].map(String::from)[..]
        );
    }

    #[test]
    fn test_last_package_marker_wins() {
        let needles =
            resolver().needles("/srv/node_modules/outer/node_modules/inner/main.js");
        assert_eq!(needles[0], "inner/main.js");
    }

    #[test]
    fn test_longest_root_wins() {
        let needles = resolver().needles("/srv/app/src/server.js");
        assert_eq!(&needles[..], &["src/server.js", "src"].map(String::from)[..]);
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(&resolver().needles("server.js")[..], &["server.js".to_owned()]);
    }

    #[test]
    fn test_unknown_root_and_empty() {
        let resolver = resolver();
        assert!(resolver.needles("/elsewhere/server.js").is_empty());
        assert!(resolver.needles("").is_empty());
        assert_eq!(resolver.short_name(""), None);
    }

    #[test]
    fn test_path_equal_to_root() {
        let resolver = resolver();
        assert!(resolver.needles("/srv/app").is_empty());
        assert!(resolver.needles("/srv/app/").is_empty());
        assert_eq!(&resolver.needles("/srv/other")[..], &["other".to_owned()]);
    }

    #[test]
    fn test_marker_as_last_segment() {
        assert!(resolver().needles("/srv/app/node_modules").is_empty());
    }

    #[test]
    fn test_needles_are_memoized() {
        let resolver = resolver();
        let first = resolver.needles("/opt/lib/a/b.js");
        let second = resolver.needles("/opt/lib/a/b.js");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_blackbox() {
        let resolver = resolver();
        let path = "/srv/app/node_modules/pkg/lib/index.js";
        assert!(resolver.is_blackboxed(path, &["pkg".into()]));
        assert!(resolver.is_blackboxed(path, &["pkg/lib".into()]));
        assert!(!resolver.is_blackboxed(path, &["lib".into()]));
        assert!(!resolver.is_blackboxed("", &["".into()]));
    }
}
