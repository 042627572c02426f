//! Rewriting of `url()` statements inside a single declaration value.
//!
//! A [`ValueTransformer`] is created once per stylesheet and applied to each of its declaration
//! values. Every `url()` content is tokenized, decoded, classified and, for local references,
//! resolved through the injected join function before being substituted by a module request.
//! Text outside the url contents, and any reference that is ignored or fails to resolve, is
//! reproduced byte for byte.

mod classify;
mod decode;
mod request;
mod tokenizer;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::options::{Join, PathsAtChar, ResolverOptions};

pub use classify::{Classification, classify, is_absolute, is_url_request};
pub use decode::{DecodedReference, decode};
pub use request::{make_request_token, url_to_request};

use request::absolutize;
pub use tokenizer::{Quote, Segment, tokenize};

/// Per-file rewriting session.
pub struct ValueTransformer {
  directory: PathBuf,
  join: Box<dyn Join>,
  options: ResolverOptions,
}

impl ValueTransformer {
  /// Bind a transformer to the stylesheet at `filename`.
  ///
  /// A relative `filename` is taken relative to the current directory. The join factory from
  /// `options` is invoked exactly once here, with the absolute filename.
  pub fn new(filename: impl AsRef<Path>, options: ResolverOptions) -> Self {
    let filename = absolutize(filename.as_ref());
    let directory = filename
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default();
    let join = options.join.bind(&filename, &options);

    Self {
      directory,
      join,
      options,
    }
  }

  /// Directory that rewritten requests are relative to.
  pub fn directory(&self) -> &Path {
    &self.directory
  }

  /// Options this session was created with.
  pub fn options(&self) -> &ResolverOptions {
    &self.options
  }

  /// Rewrite every resolvable `url()` reference in `value`.
  ///
  /// `paths_at_char` is only consulted for relative references. Errors raised by the join
  /// function abort the whole value.
  pub fn transform_value(&self, value: &str, paths_at_char: &dyn PathsAtChar) -> Result<String> {
    let mut output = String::with_capacity(value.len());

    for segment in tokenize(value) {
      match segment {
        Segment::Literal(text) => output.push_str(text),
        Segment::UrlContent {
          text,
          quote,
          offset,
        } => match self.rewrite_content(text, quote, offset, paths_at_char)? {
          Some(token) => output.push_str(&token),
          None => output.push_str(text),
        },
      }
    }

    Ok(output)
  }

  fn rewrite_content(
    &self,
    text: &str,
    quote: Quote,
    offset: usize,
    paths_at_char: &dyn PathsAtChar,
  ) -> Result<Option<String>> {
    let DecodedReference { uri, query } = decode(text, quote);
    let classification = classify(&uri, &self.options);

    let resolved = match classification {
      Classification::Relative => {
        let candidates = paths_at_char.paths_at_char(offset);
        self.join.join(&uri, Some(candidates.as_slice()))?
      }
      Classification::Absolute => self.join.join(&uri, None)?,
      Classification::Ignored => None,
    };

    let query = if self.options.keep_query { &*query } else { "" };
    let token = resolved
      .as_deref()
      .and_then(|absolute| make_request_token(&self.directory, absolute, query));

    match (&resolved, &token) {
      (Some(absolute), Some(token)) => self.options.emit_debug(format_args!(
        "url({text}) at {offset}: {classification:?} -> {} -> {token}",
        absolute.display()
      )),
      (Some(absolute), None) => self.options.emit_debug(format_args!(
        "url({text}) at {offset}: {classification:?} -> {} is not relative to {}",
        absolute.display(),
        self.directory.display()
      )),
      (None, _) => self.options.emit_debug(format_args!(
        "url({text}) at {offset}: {classification:?}, unresolved"
      )),
    }

    Ok(token)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::sync::{Arc, Mutex};

  use anyhow::anyhow;

  use super::*;

  type Calls = Arc<Mutex<Vec<(String, Option<Vec<PathBuf>>)>>>;

  /// Join stub that resolves uris through a fixed table and records every call.
  fn table_join(entries: &[(&str, &str)], calls: Calls) -> ResolverOptions {
    let table: Vec<(String, PathBuf)> = entries
      .iter()
      .map(|(uri, path)| (uri.to_string(), PathBuf::from(path)))
      .collect();

    ResolverOptions::new(move |_: &Path, _: &ResolverOptions| -> Box<dyn Join> {
      let table = table.clone();
      let calls = calls.clone();
      Box::new(
        move |uri: &str, candidates: Option<&[PathBuf]>| -> Result<Option<PathBuf>> {
          calls
            .lock()
            .expect("calls lock poisoned")
            .push((uri.to_string(), candidates.map(<[PathBuf]>::to_vec)));
          Ok(
            table
              .iter()
              .find(|(key, _)| key == uri)
              .map(|(_, path)| path.clone()),
          )
        },
      )
    })
  }

  fn no_paths(_: usize) -> Vec<PathBuf> {
    Vec::new()
  }

  fn transformer(entries: &[(&str, &str)]) -> (ValueTransformer, Calls) {
    let calls = Calls::default();
    let options = table_join(entries, calls.clone());
    (ValueTransformer::new("/project/src/style.css", options), calls)
  }

  #[test]
  fn values_without_urls_are_unchanged() {
    let (transformer, calls) = transformer(&[]);
    let value = "1px solid rgba(0, 0, 0, 0.5)";
    assert_eq!(transformer.transform_value(value, &no_paths).unwrap(), value);
    assert!(calls.lock().unwrap().is_empty());
  }

  #[test]
  fn rewrites_relative_reference() {
    let (transformer, calls) = transformer(&[("./img.png", "/project/src/img.png")]);
    let output = transformer.transform_value("url(./img.png)", &no_paths).unwrap();
    assert_eq!(output, "url(./img.png)");
    assert_eq!(calls.lock().unwrap().as_slice(), &[(
      "./img.png".to_string(),
      Some(Vec::new())
    )]);
  }

  #[test]
  fn rewrites_into_nested_directory() {
    let (transformer, _) = transformer(&[("img.png", "/project/src/images/img.png")]);
    let output = transformer.transform_value("url('img.png')", &no_paths).unwrap();
    assert_eq!(output, "url('./images/img.png')");
  }

  #[test]
  fn rewrites_multiple_statements_independently() {
    let (transformer, _) = transformer(&[
      ("a.png", "/project/assets/a.png"),
      ("b.png", "/project/src/b.png"),
    ]);
    let output = transformer
      .transform_value("background: url(a.png), url(b.png)", &no_paths)
      .unwrap();
    assert_eq!(output, "background: url(../assets/a.png), url(./b.png)");
  }

  #[test]
  fn preserves_query_and_fragment() {
    let (transformer, calls) = transformer(&[("img.png", "/project/src/img.png")]);
    let output = transformer
      .transform_value("url(\"img.png?v=2\") url(img.png#frag)", &no_paths)
      .unwrap();
    assert_eq!(output, "url(\"./img.png?v=2\") url(./img.png#frag)");
    assert_eq!(calls.lock().unwrap().len(), 2);
  }

  #[test]
  fn drops_query_when_disabled() {
    let calls = Calls::default();
    let options = table_join(&[("img.png", "/project/src/img.png")], calls).with_keep_query(false);
    let transformer = ValueTransformer::new("/project/src/style.css", options);
    let output = transformer.transform_value("url(img.png?v=2)", &no_paths).unwrap();
    assert_eq!(output, "url(./img.png)");
  }

  #[test]
  fn ignored_references_never_reach_join() {
    let (transformer, calls) = transformer(&[]);
    let value = "url(http://example.com/a.png), url(data:image/png;base64,AAA), \
                 url(~module/img.png), url(), url('#filter')";
    assert_eq!(transformer.transform_value(value, &no_paths).unwrap(), value);
    assert!(calls.lock().unwrap().is_empty());
  }

  #[test]
  fn unresolved_references_are_left_unchanged() {
    let (transformer, calls) = transformer(&[]);
    let value = "url( 'missing.png' )";
    assert_eq!(transformer.transform_value(value, &no_paths).unwrap(), value);
    assert_eq!(calls.lock().unwrap().len(), 1);
  }

  #[test]
  fn quoted_backslashes_are_unescaped_before_join() {
    let (transformer, calls) = transformer(&[(r"a\b.png", "/project/src/a/b.png")]);
    let output = transformer.transform_value(r"url('a\\b.png')", &no_paths).unwrap();
    assert_eq!(output, "url('./a/b.png')");

    let output = transformer.transform_value(r"url(a\\b.png)", &no_paths).unwrap();
    assert_eq!(output, r"url(a\\b.png)");
    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, r"a\b.png");
    assert_eq!(calls[1].0, r"a\\b.png");
  }

  #[test]
  fn absolute_references_need_root() {
    let entries = [("/abs/img.png", "/srv/site/abs/img.png")];
    let (transformer, calls) = transformer(&entries);
    let value = "url(/abs/img.png)";
    assert_eq!(transformer.transform_value(value, &no_paths).unwrap(), value);
    assert!(calls.lock().unwrap().is_empty());

    let calls = Calls::default();
    let options = table_join(&entries, calls.clone()).with_root("/srv/site");
    let transformer = ValueTransformer::new("/srv/site/css/style.css", options);
    let output = transformer.transform_value(value, &no_paths).unwrap();
    assert_eq!(output, "url(../abs/img.png)");
    assert_eq!(calls.lock().unwrap().as_slice(), &[(
      "/abs/img.png".to_string(),
      None
    )]);
  }

  #[test]
  fn position_lookup_is_lazy_and_uses_original_offsets() {
    let (transformer, calls) = transformer(&[("b.png", "/project/src/b.png")]);
    let offsets = RefCell::new(Vec::new());
    let lookup = |offset: usize| {
      offsets.borrow_mut().push(offset);
      vec![PathBuf::from(format!("/base/{offset}"))]
    };

    let value = "url(http://x/a.png) url('b.png') url(~c.png)";
    let output = transformer.transform_value(value, &lookup).unwrap();
    assert_eq!(output, "url(http://x/a.png) url('./b.png') url(~c.png)");
    assert_eq!(offsets.into_inner(), vec![25]);
    assert_eq!(calls.lock().unwrap()[0].1, Some(vec![PathBuf::from("/base/25")]));
  }

  #[test]
  fn join_errors_propagate() {
    let options = ResolverOptions::new(|_: &Path, _: &ResolverOptions| -> Box<dyn Join> {
      Box::new(|uri: &str, _: Option<&[PathBuf]>| -> Result<Option<PathBuf>> {
        Err(anyhow!("cannot resolve {uri}"))
      })
    });
    let transformer = ValueTransformer::new("/project/src/style.css", options);
    let error = transformer
      .transform_value("url(a.png)", &no_paths)
      .unwrap_err();
    assert_eq!(error.to_string(), "cannot resolve a.png");

    let value = "url(http://example.com/a.png)";
    assert_eq!(transformer.transform_value(value, &no_paths).unwrap(), value);
  }

  #[test]
  fn join_factory_is_bound_once_per_file() {
    let binds = Arc::new(Mutex::new(Vec::new()));
    let recorded = binds.clone();
    let options = ResolverOptions::new(move |filename: &Path, _: &ResolverOptions| -> Box<dyn Join> {
      recorded
        .lock()
        .expect("binds lock poisoned")
        .push(filename.to_path_buf());
      Box::new(|_: &str, _: Option<&[PathBuf]>| -> Result<Option<PathBuf>> { Ok(None) })
    });

    let transformer = ValueTransformer::new("/project/src/style.css", options);
    transformer.transform_value("url(a.png)", &no_paths).unwrap();
    transformer.transform_value("url(b.png)", &no_paths).unwrap();

    assert_eq!(binds.lock().unwrap().as_slice(), &[PathBuf::from("/project/src/style.css")]);
    assert_eq!(transformer.directory(), Path::new("/project/src"));
  }

  #[test]
  fn relative_filenames_are_anchored_at_current_directory() {
    let cwd = std::env::current_dir().unwrap();
    let options = table_join(&[("a.png", "/abs/elsewhere/a.png")], Calls::default());
    let transformer = ValueTransformer::new("src/style.css", options);
    assert_eq!(transformer.directory(), cwd.join("src"));

    let output = transformer.transform_value("url(a.png)", &no_paths).unwrap();
    let expected = pathdiff::diff_paths("/abs/elsewhere/a.png", cwd.join("src")).unwrap();
    assert_eq!(output, format!("url({})", expected.to_string_lossy()));
    assert!(output.starts_with("url(../"));
    assert!(!output.contains("//abs"));
  }

  #[test]
  fn relative_join_results_resolve_from_current_directory() {
    let options = table_join(&[("a.png", "src/img/a.png")], Calls::default());
    let transformer = ValueTransformer::new("src/style.css", options);
    let output = transformer.transform_value("url('a.png')", &no_paths).unwrap();
    assert_eq!(output, "url('./img/a.png')");
  }

  #[test]
  fn position_lookup_receives_character_offsets() {
    let (transformer, _) = transformer(&[("a.png", "/project/src/a.png")]);
    let offsets = RefCell::new(Vec::new());
    let lookup = |offset: usize| {
      offsets.borrow_mut().push(offset);
      Vec::new()
    };

    let output = transformer.transform_value("\"ü\" url(a.png)", &lookup).unwrap();
    assert_eq!(output, "\"ü\" url(./a.png)");
    assert_eq!(offsets.into_inner(), vec![8]);
  }

  #[test]
  fn debug_sink_receives_one_message_per_statement() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let recorded = messages.clone();
    let options = table_join(&[("a.png", "/project/src/a.png")], Calls::default()).with_debug_sink(
      move |message: &str| {
        recorded
          .lock()
          .expect("messages lock poisoned")
          .push(message.to_string());
      },
    );
    let transformer = ValueTransformer::new("/project/src/style.css", options);
    transformer
      .transform_value("url(a.png) url(http://x/b.png)", &no_paths)
      .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].ends_with("-> ./a.png"));
    assert!(messages[1].contains("Ignored, unresolved"));
  }
}
