//! Loader configuration, resolved from the environment once and then passed
//! around explicitly.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming the model artifact location.
pub const MODEL_PATH_ENV: &str = "MODEL_PATH";

/// Location used when `MODEL_PATH` is unset or empty.
pub const DEFAULT_MODEL_PATH: &str = "/app/model.pkl";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Filesystem location of the serialized artifact. Never empty.
    model_path: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

impl LoaderConfig {
    /// Use an explicit path. An empty path falls back to the default.
    pub fn new(model_path: impl AsRef<Path>) -> Self {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Self::default();
        }
        Self {
            model_path: model_path.to_path_buf(),
        }
    }

    /// Read `MODEL_PATH` as raw OS bytes; non-UTF-8 paths are kept as-is.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Resolve through an arbitrary key lookup, so callers (and tests) don't
    /// have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        match lookup(MODEL_PATH_ENV) {
            Some(value) if !value.is_empty() => Self {
                model_path: PathBuf::from(value),
            },
            Some(_) => {
                tracing::warn!("{} is set but empty -- using {}", MODEL_PATH_ENV, DEFAULT_MODEL_PATH);
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_with(value: Option<&'static str>) -> impl Fn(&str) -> Option<OsString> {
        move |key| {
            assert_eq!(key, MODEL_PATH_ENV);
            value.map(OsString::from)
        }
    }

    #[test]
    fn unset_variable_resolves_to_default() {
        let config = LoaderConfig::from_lookup(lookup_with(None));
        assert_eq!(config.model_path(), Path::new("/app/model.pkl"));
    }

    #[test]
    fn empty_variable_resolves_to_default() {
        let config = LoaderConfig::from_lookup(lookup_with(Some("")));
        assert_eq!(config.model_path(), Path::new(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn set_variable_wins_over_default() {
        let config = LoaderConfig::from_lookup(lookup_with(Some("/tmp/good.model")));
        assert_eq!(config.model_path(), Path::new("/tmp/good.model"));
    }

    #[test]
    fn explicit_empty_path_is_never_kept() {
        assert_eq!(LoaderConfig::new(""), LoaderConfig::default());
        assert_eq!(
            LoaderConfig::new("models/fare.bin").model_path(),
            Path::new("models/fare.bin")
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let raw = std::ffi::OsStr::from_bytes(b"/tmp/mod\xffel.bin").to_os_string();
        let expected = raw.clone();
        let config = LoaderConfig::from_lookup(move |_| Some(raw.clone()));
        assert_eq!(config.model_path(), Path::new(&expected));
    }

    // The only test in the crate that touches the real MODEL_PATH variable.
    #[cfg(unix)]
    #[test]
    fn from_env_reads_non_utf8_variable() {
        use std::os::unix::ffi::OsStrExt;

        let raw = std::ffi::OsStr::from_bytes(b"/tmp/mod\xffel.bin");
        std::env::set_var(MODEL_PATH_ENV, raw);
        let config = LoaderConfig::from_env();
        std::env::remove_var(MODEL_PATH_ENV);
        assert_eq!(config.model_path(), Path::new(raw));
    }
}
