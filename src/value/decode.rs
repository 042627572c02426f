//! Decoding of raw `url()` content into a uri and its query or fragment.

use std::borrow::Cow;

use super::tokenizer::Quote;

/// A `url()` reference split into the path part and the trailing query or fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReference<'a> {
  /// Path portion used for classification and resolution.
  pub uri: Cow<'a, str>,
  /// Everything from the first `?` or `#` onward, or empty.
  pub query: Cow<'a, str>,
}

/// Decode raw content captured by the tokenizer.
///
/// Quoted content has doubled backslashes collapsed; no other escape is interpreted.
pub fn decode(text: &str, quote: Quote) -> DecodedReference<'_> {
  let unescaped = if quote.is_quoted() && text.contains(r"\\") {
    Cow::Owned(text.replace(r"\\", r"\"))
  } else {
    Cow::Borrowed(text)
  };

  split_query(unescaped)
}

fn split_query(value: Cow<'_, str>) -> DecodedReference<'_> {
  let Some(index) = value.find(['?', '#']) else {
    return DecodedReference {
      uri: value,
      query: Cow::Borrowed(""),
    };
  };

  match value {
    Cow::Borrowed(text) => DecodedReference {
      uri: Cow::Borrowed(&text[..index]),
      query: Cow::Borrowed(&text[index..]),
    },
    Cow::Owned(mut text) => {
      let query = text.split_off(index);
      DecodedReference {
        uri: Cow::Owned(text),
        query: Cow::Owned(query),
      }
    }
  }
}
