//! Default join function searching candidate base directories on disk.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::options::{Join, JoinFactory, ResolverOptions};

/// Join factory resolving references to existing files.
///
/// Relative references are tried against each candidate base path in order, falling back to the
/// stylesheet's own directory when no candidates are known. Root-relative references are joined
/// onto the configured root. The first existing file wins; when nothing exists the reference is
/// reported as unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemJoin;

impl JoinFactory for FilesystemJoin {
  fn bind(&self, filename: &Path, options: &ResolverOptions) -> Box<dyn Join> {
    Box::new(BoundFilesystemJoin {
      directory: filename.parent().map(Path::to_path_buf).unwrap_or_default(),
      root: options.effective_root().map(PathBuf::from),
      options: options.clone(),
    })
  }
}

struct BoundFilesystemJoin {
  directory: PathBuf,
  root: Option<PathBuf>,
  options: ResolverOptions,
}

impl Join for BoundFilesystemJoin {
  fn join(&self, uri: &str, candidates: Option<&[PathBuf]>) -> Result<Option<PathBuf>> {
    let (bases, relative) = match candidates {
      Some([]) => (vec![self.directory.clone()], uri),
      Some(candidates) => (dedup_bases(candidates), uri),
      None => (self.root.iter().cloned().collect(), uri.trim_start_matches('/')),
    };

    let found = bases
      .iter()
      .map(|base| normalise_path(&base.join(relative)))
      .find(|path| path.is_file());

    if self.options.debug && found.is_none() {
      let tried: Vec<String> = bases
        .iter()
        .map(|base| base.display().to_string())
        .collect();
      self
        .options
        .emit_debug(format_args!("no file found for {uri} in [{}]", tried.join(", ")));
    }

    Ok(found)
  }
}

fn dedup_bases(candidates: &[PathBuf]) -> Vec<PathBuf> {
  let mut bases: Vec<PathBuf> = Vec::with_capacity(candidates.len());
  for candidate in candidates {
    if !bases.contains(candidate) {
      bases.push(candidate.clone());
    }
  }
  bases
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalise_path(path: &Path) -> PathBuf {
  let mut result = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match result.components().next_back() {
        Some(Component::Normal(_)) => {
          result.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => result.push(component),
      },
      other => result.push(other),
    }
  }
  result
}
