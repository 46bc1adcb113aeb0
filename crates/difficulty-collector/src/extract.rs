//! Difficulty score extraction from a companion page.
//!
//! Text is pulled from `<strong>`/`<b>` elements first, then paragraphs,
//! then the whole document; each block is tried against [`PATTERNS`] in
//! order. A last pass scans paragraph sentences for "out of" with two
//! numbers.

use std::sync::LazyLock;

use difficulty_core::Score;
use regex::Regex;

/// Scale assumed by the bare `X out of 5.` pattern.
const DEFAULT_SCALE: u32 = 5;

const NUMBER: &str = r"(\d+(?:\.\d+)?)";

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  [
    format!(r"(?i)Today's difficulty is {NUMBER} out of (\d+)"),
    format!(r"(?i)difficulty is {NUMBER} out of (\d+)"),
    format!(r"(?i)difficulty rating of {NUMBER} out of (\d+)"),
    format!(r"(?i)difficulty.*?{NUMBER}.*?out of (\d+)"),
    format!(r"{NUMBER} out of 5\."),
  ]
  .iter()
  .map(|p| compile(p))
  .collect()
});

static EMPHASIS: LazyLock<Regex> =
  LazyLock::new(|| compile(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)>"));
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<p\b[^>]*>(.*?)</p>"));
static SCRIPT: LazyLock<Regex> =
  LazyLock::new(|| compile(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]*>"));
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| compile(r"[.!?]\s+"));
static ANY_NUMBER: LazyLock<Regex> = LazyLock::new(|| compile(NUMBER));

fn compile(pattern: &str) -> Regex {
  Regex::new(pattern).expect("static pattern compiles")
}

/// Find the difficulty score in a page, if it has one.
pub fn extract_score(html: &str) -> Option<Score> {
  let html = decode_entities(html);

  let emphasis = element_texts(&EMPHASIS, &html);
  let paragraphs = element_texts(&PARAGRAPH, &html);
  let document = strip_tags(&SCRIPT.replace_all(&html, ""));

  emphasis
    .iter()
    .chain(paragraphs.iter())
    .chain(std::iter::once(&document))
    .find_map(|text| match_patterns(text))
    .or_else(|| paragraphs.iter().find_map(|text| scan_sentences(text)))
}

/// Replace the handful of entities that show up around the rating.
pub fn decode_entities(html: &str) -> String {
  html
    .replace("&#x27;", "'")
    .replace("&#39;", "'")
    .replace("&rsquo;", "'")
    .replace("&lsquo;", "'")
    .replace('\u{2019}', "'")
    .replace("&nbsp;", " ")
    .replace("&quot;", "\"")
    .replace("&amp;", "&")
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn element_texts(element: &Regex, html: &str) -> Vec<String> {
  element
    .captures_iter(html)
    .filter_map(|c| c.get(1))
    .map(|m| strip_tags(m.as_str()))
    .filter(|text| !text.is_empty())
    .collect()
}

fn strip_tags(fragment: &str) -> String {
  TAG.replace_all(fragment, "").trim().to_string()
}

fn match_patterns(text: &str) -> Option<Score> {
  PATTERNS.iter().find_map(|pattern| {
    let caps = pattern.captures(text)?;
    let value = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2) {
      Some(m) => m.as_str().parse().ok()?,
      None => DEFAULT_SCALE,
    };
    Some(Score { value, scale })
  })
}

fn scan_sentences(text: &str) -> Option<Score> {
  SENTENCE_END
    .split(text)
    .filter(|sentence| sentence.contains("out of"))
    .find_map(|sentence| {
      let mut numbers = ANY_NUMBER
        .find_iter(sentence)
        .filter_map(|m| m.as_str().parse::<f64>().ok());
      let value = numbers.next()?;
      let scale = numbers.next()?;
      Some(Score { value, scale: scale as u32 })
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn score(value: f64, scale: u32) -> Option<Score> {
    Some(Score { value, scale })
  }

  #[test]
  fn strong_element_with_encoded_apostrophe() {
    let html = "<html><body><p>Intro.</p><strong>Today&#x27;s difficulty is 2.3 out of 5</strong></body></html>";
    assert_eq!(extract_score(html), score(2.3, 5));
  }

  #[test]
  fn paragraph_with_curly_apostrophe() {
    let html = "<p>Hello solvers. Today’s difficulty is 3 out of 5. Good luck!</p>";
    assert_eq!(extract_score(html), score(3.0, 5));
  }

  #[test]
  fn rating_phrase_with_other_scale() {
    let html = "<div><p>This puzzle has a difficulty rating of 7.5 out of 10.</p></div>";
    assert_eq!(extract_score(html), score(7.5, 10));
  }

  #[test]
  fn loose_difficulty_phrase() {
    let html = "<p>Our difficulty meter reads 4, that is, out of 5 possible.</p>";
    assert_eq!(extract_score(html), score(4.0, 5));
  }

  #[test]
  fn bare_out_of_five() {
    let html = "<p>We rate it 1.8 out of 5. Enjoy.</p>";
    assert_eq!(extract_score(html), score(1.8, 5));
  }

  #[test]
  fn emphasis_wins_over_paragraph() {
    let html = "<p>Yesterday the difficulty is 4 out of 5.</p><b>Today's difficulty is 2 out of 5</b>";
    assert_eq!(extract_score(html), score(2.0, 5));
  }

  #[test]
  fn text_outside_elements() {
    let html = "<div><span>Today's difficulty is</span> <em>3.1</em> out of 5</div>";
    assert_eq!(extract_score(html), score(3.1, 5));
  }

  #[test]
  fn sentence_scan_fallback() {
    let html = "<p>Solvers gave it 3.4 stars out of 5 stars! Nice.</p>";
    assert_eq!(extract_score(html), score(3.4, 5));
  }

  #[test]
  fn scripts_are_ignored() {
    let html = "<script>var s = 'difficulty is 9 out of 10';</script><div>no rating</div>";
    assert_eq!(extract_score(html), None);
  }

  #[test]
  fn page_without_rating() {
    assert_eq!(extract_score("<html><p>Page not found.</p></html>"), None);
  }

  #[test]
  fn decodes_entities() {
    assert_eq!(decode_entities("Today&rsquo;s&nbsp;rock &amp; roll"), "Today's rock & roll");
  }
}
