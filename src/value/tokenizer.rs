//! Split a declaration value into literal text and `url()` contents.

/// Quoting style of a `url()` statement's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
  /// `url(foo.png)`
  None,
  /// `url('foo.png')`
  Single,
  /// `url("foo.png")`
  Double,
}

impl Quote {
  fn from_char(value: char) -> Option<Self> {
    match value {
      '\'' => Some(Self::Single),
      '"' => Some(Self::Double),
      _ => None,
    }
  }

  /// Whether backslash doubling should be undone for this content.
  pub fn is_quoted(self) -> bool {
    !matches!(self, Self::None)
  }
}

/// A region of the original value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
  /// Text reproduced unchanged, including the `url(` opener, quotes and closer.
  Literal(&'a str),
  /// Raw content of a `url()` statement.
  UrlContent {
    /// Content between the quotes, or the whole unquoted run.
    text: &'a str,
    /// Quoting style detected around the content.
    quote: Quote,
    /// Character offset of `text` within the original value.
    offset: usize,
  },
}

impl<'a> Segment<'a> {
  /// The original text covered by this segment.
  pub fn as_str(&self) -> &'a str {
    match *self {
      Self::Literal(text) | Self::UrlContent { text, .. } => text,
    }
  }
}

/// Tokenize `value` into an ordered list of segments.
///
/// Concatenating [`Segment::as_str`] over the result always reproduces `value` exactly.
pub fn tokenize(value: &str) -> Vec<Segment<'_>> {
  let mut segments = Vec::new();
  let mut literal_start = 0;
  let mut cursor = 0;
  let mut counted = 0;
  let mut char_offset = 0;

  while let Some(found) = find_url_keyword(value, cursor) {
    let Some(statement) = scan_statement(value, found) else {
      cursor = found + URL_KEYWORD.len();
      continue;
    };

    // Byte indices slice the value; the position lookup counts characters.
    char_offset += value[counted..statement.content_start].chars().count();
    counted = statement.content_start;

    // Everything up to and including the opening quote stays literal.
    push_literal(&mut segments, &value[literal_start..statement.content_start]);
    segments.push(Segment::UrlContent {
      text: &value[statement.content_start..statement.content_end],
      quote: statement.quote,
      offset: char_offset,
    });

    literal_start = statement.content_end;
    cursor = statement.end;
  }

  push_literal(&mut segments, &value[literal_start..]);
  segments
}

const URL_KEYWORD: &str = "url";

struct Statement {
  content_start: usize,
  content_end: usize,
  quote: Quote,
  /// Offset just past the closing `)`.
  end: usize,
}

fn push_literal<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
  if !text.is_empty() {
    segments.push(Segment::Literal(text));
  }
}

/// Find the next `url` keyword that does not continue an identifier such as `curl` or `--my-url`.
fn find_url_keyword(value: &str, from: usize) -> Option<usize> {
  let bytes = value.as_bytes();
  (from..bytes.len().saturating_sub(URL_KEYWORD.len() - 1)).find(|&index| {
    bytes[index..index + URL_KEYWORD.len()].eq_ignore_ascii_case(b"url")
      && (index == 0 || !is_ident_byte(bytes[index - 1]))
  })
}

fn is_ident_byte(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || !byte.is_ascii()
}

/// Scan a complete `url( ... )` statement starting at the keyword.
fn scan_statement(value: &str, keyword_start: usize) -> Option<Statement> {
  let after_keyword = skip_whitespace(value, keyword_start + URL_KEYWORD.len());
  let rest = value.get(after_keyword..)?;
  if !rest.starts_with('(') {
    return None;
  }

  let content_start = skip_whitespace(value, after_keyword + 1);
  scan_quoted(value, content_start).or_else(|| scan_unquoted(value, content_start))
}

fn scan_quoted(value: &str, open: usize) -> Option<Statement> {
  let quote_char = value[open..].chars().next()?;
  let quote = Quote::from_char(quote_char)?;
  let content_start = open + quote_char.len_utf8();

  let mut chars = value[content_start..].char_indices();
  let content_end = loop {
    let (index, current) = chars.next()?;
    match current {
      '\\' => {
        chars.next();
      }
      _ if current == quote_char => break content_start + index,
      _ => {}
    }
  };

  let close = skip_whitespace(value, content_end + quote_char.len_utf8());
  value[close..].starts_with(')').then_some(Statement {
    content_start,
    content_end,
    quote,
    end: close + 1,
  })
}

fn scan_unquoted(value: &str, content_start: usize) -> Option<Statement> {
  let close = content_start + value[content_start..].find(')')?;
  let content_end = content_start + value[content_start..close].trim_end().len();

  Some(Statement {
    content_start,
    content_end,
    quote: Quote::None,
    end: close + 1,
  })
}

fn skip_whitespace(value: &str, from: usize) -> usize {
  let rest = &value[from..];
  from + (rest.len() - rest.trim_start().len())
}
