//! Project configuration loader for url rewriting options.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::options::{JoinFactory, ResolverOptions};

/// File name searched for by [`RewriteConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "css-url-resolver.config.json";

/// Discoverable configuration describing how `url()` references are rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewriteConfig {
  /// Directory that root-relative references resolve against.
  pub root: Option<String>,
  /// Whether query strings and fragments are carried over to rewritten requests.
  pub keep_query: bool,
  /// Log every url statement at `debug` level.
  pub debug: bool,
}

impl Default for RewriteConfig {
  fn default() -> Self {
    Self {
      root: None,
      keep_query: true,
      debug: false,
    }
  }
}

/// Errors that can occur while loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
  /// Failed to read the configuration file from disk.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON configuration file.
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io { path, source } => {
        write!(f, "failed to read {}: {}", path.display(), source)
      }
      Self::Parse { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse { source, .. } => Some(source),
    }
  }
}

impl RewriteConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing or malformed file yields the default configuration.
  pub fn discover(dir: &Path) -> Self {
    Self::load_from_path(dir.join(DEFAULT_CONFIG_FILE)).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  ///
  /// A missing file is not an error and produces the defaults.
  pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
        return Ok(Self::default());
      }
      Err(err) => {
        return Err(ConfigError::Io {
          path: path.to_path_buf(),
          source: err,
        });
      }
    };

    serde_json::from_str(&contents).map_err(|err| ConfigError::Parse {
      path: path.to_path_buf(),
      source: err,
    })
  }

  /// Convert the configuration into resolver options using `join`.
  pub fn into_options(self, join: impl JoinFactory + 'static) -> ResolverOptions {
    ResolverOptions {
      root: self.root,
      join: Arc::new(join),
      debug: self.debug,
      debug_sink: None,
      keep_query: self.keep_query,
    }
  }
}
