use crate::{
    blueprint::DEFAULT_BASE_DIR,
    errors::{FileOperation, IoError},
};
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lampgen.toml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("I/O error within config domain")]
    #[diagnostic(code(lampgen::config::io))]
    Io(#[from] IoError),

    #[error("Unable to parse toml file at '{}': {source}", .path.display())]
    #[diagnostic(
        code(lampgen::config::parse_toml),
        help("Supported keys are `base_dir` (string) and `atomic` (bool)")
    )]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of an optional `lampgen.toml`.
///
/// ```toml
/// base_dir = "infra/ansible"
/// atomic = true
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Relative paths are resolved against the working directory, not the config file.
    pub base_dir: Option<PathBuf>,
    pub atomic: Option<bool>,
}
impl ConfigFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        toml::from_str(&content).map_err(|err| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: err,
        })
    }

    /// Loads `explicit` if given (it must exist), otherwise [`DEFAULT_CONFIG_FILE`] inside
    /// `working_dir` if present, otherwise an empty config.
    pub fn discover(explicit: Option<&Path>, working_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::debug!("loading config from {}", path.display());
            return Self::from_file(path);
        }

        let implicit = working_dir.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            log::debug!("loading config from {}", implicit.display());
            return Self::from_file(implicit);
        }

        Ok(Self::default())
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub atomic: bool,
}
impl Settings {
    /// Command line beats the config file, which beats the built-in defaults.
    pub fn resolve(file: ConfigFile, base_dir: Option<PathBuf>, atomic: bool) -> Self {
        Self {
            base_dir: base_dir
                .or(file.base_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR)),
            atomic: atomic || file.atomic.unwrap_or(false),
        }
    }
}
impl Default for Settings {
    fn default() -> Self {
        Self::resolve(ConfigFile::default(), None, false)
    }
}
