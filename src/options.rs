//! Resolver options and the collaborator seams injected into a [`ValueTransformer`].
//!
//! The transformer never touches the filesystem itself. Turning a `url()` reference into an
//! absolute path is delegated to a [`Join`] produced by the configured [`JoinFactory`], and the
//! candidate base directories for a reference come from a [`PathsAtChar`] lookup supplied per
//! value (usually backed by source map data from an upstream stage).
//!
//! [`ValueTransformer`]: crate::value::ValueTransformer

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

/// Resolve a candidate uri into an absolute filesystem path.
///
/// `candidates` is `Some` for relative references (the base paths valid at the reference's
/// position, possibly empty) and `None` for root-relative references, which resolve against the
/// configured root instead. Returning `Ok(None)` means the file could not be located and the
/// reference is left untouched. Errors abort the value being transformed.
pub trait Join: Send + Sync {
  /// Resolve `uri` against the supplied candidate base paths.
  fn join(&self, uri: &str, candidates: Option<&[PathBuf]>) -> Result<Option<PathBuf>>;
}

impl<F> Join for F
where
  F: Fn(&str, Option<&[PathBuf]>) -> Result<Option<PathBuf>> + Send + Sync,
{
  fn join(&self, uri: &str, candidates: Option<&[PathBuf]>) -> Result<Option<PathBuf>> {
    self(uri, candidates)
  }
}

/// Produce a [`Join`] bound to a single stylesheet.
///
/// The factory is invoked once per file, when the transformer session is created.
pub trait JoinFactory: Send + Sync {
  /// Bind a join function to `filename` and the active options.
  fn bind(&self, filename: &Path, options: &ResolverOptions) -> Box<dyn Join>;
}

impl<F> JoinFactory for F
where
  F: Fn(&Path, &ResolverOptions) -> Box<dyn Join> + Send + Sync,
{
  fn bind(&self, filename: &Path, options: &ResolverOptions) -> Box<dyn Join> {
    self(filename, options)
  }
}

/// Position lookup returning the candidate base paths at a character offset within a value.
pub trait PathsAtChar {
  /// Candidate absolute base paths valid at `offset`. May be empty.
  fn paths_at_char(&self, offset: usize) -> Vec<PathBuf>;
}

impl<F> PathsAtChar for F
where
  F: Fn(usize) -> Vec<PathBuf>,
{
  fn paths_at_char(&self, offset: usize) -> Vec<PathBuf> {
    self(offset)
  }
}

/// Receiver for debug messages, used instead of the `log` facade when set.
pub type DebugSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Options shared by every transformer session.
#[derive(Clone)]
pub struct ResolverOptions {
  /// Directory used for root-relative references. Absolute references are ignored unless this
  /// is a non-empty string.
  pub root: Option<String>,
  /// Factory for the per-file join function.
  pub join: Arc<dyn JoinFactory>,
  /// Emit a debug message for every url statement.
  pub debug: bool,
  /// Where debug messages go. `None` logs them at `debug` level.
  pub debug_sink: Option<DebugSink>,
  /// Re-append the query or fragment to rewritten requests.
  pub keep_query: bool,
}

impl ResolverOptions {
  /// Options with no root, debug disabled and queries preserved.
  pub fn new(join: impl JoinFactory + 'static) -> Self {
    Self {
      root: None,
      join: Arc::new(join),
      debug: false,
      debug_sink: None,
      keep_query: true,
    }
  }

  /// Set the root directory used for root-relative references.
  pub fn with_root(mut self, root: impl Into<String>) -> Self {
    self.root = Some(root.into());
    self
  }

  /// Toggle debug logging.
  pub fn with_debug(mut self, debug: bool) -> Self {
    self.debug = debug;
    self
  }

  /// Enable debug output and route it to `sink`.
  pub fn with_debug_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
    self.debug = true;
    self.debug_sink = Some(Arc::new(sink));
    self
  }

  /// Toggle query/fragment preservation.
  pub fn with_keep_query(mut self, keep_query: bool) -> Self {
    self.keep_query = keep_query;
    self
  }

  /// The configured root, only when it is usable.
  pub fn effective_root(&self) -> Option<&str> {
    self.root.as_deref().filter(|root| !root.is_empty())
  }

  /// Report a debug message when debugging is enabled.
  pub fn emit_debug(&self, message: fmt::Arguments<'_>) {
    if !self.debug {
      return;
    }
    match &self.debug_sink {
      Some(sink) => sink(&message.to_string()),
      None => log::debug!("{message}"),
    }
  }
}

impl fmt::Debug for ResolverOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResolverOptions")
      .field("root", &self.root)
      .field("debug", &self.debug)
      .field("debug_sink", &self.debug_sink.is_some())
      .field("keep_query", &self.keep_query)
      .finish_non_exhaustive()
  }
}
