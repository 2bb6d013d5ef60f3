//! Display normalization for scraped track and artist names.

/// Capitalize the first letter of every space-separated word and lower-case the rest.
///
/// Never fails: empty input, or input containing an empty word (leading,
/// trailing or doubled spaces), yields an empty string.
pub fn to_sentence_case(s: &str) -> String {
  if s.is_empty() {
    return String::new();
  }

  let mut words = Vec::new();
  for word in s.split(' ') {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
      return String::new();
    };
    let mut out: String = first.to_uppercase().collect();
    out.push_str(&chars.as_str().to_lowercase());
    words.push(out);
  }

  words.join(" ")
}
