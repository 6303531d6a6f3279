//! Log preprocessor - reduce an uploaded log to the lines worth sending to the model

use serde::Serialize;
use thiserror::Error;

/// Maximum number of characters kept in an excerpt
pub const EXCERPT_CHAR_BUDGET: usize = 15_000;

// keywords a line must contain (lowercase) to be kept
const KEYWORDS: [&str; 2] = ["error", "warning"];

// decode error type
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("log file is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

// LOG EXCERPT //

/// Filtered, truncated log text used as model context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogExcerpt {
    text: String,
    matched_lines: usize,
    truncated: bool,
}

impl LogExcerpt {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Number of lines that matched before truncation
    pub fn matched_lines(&self) -> usize {
        self.matched_lines
    }

    /// True when the joined lines were longer than the budget
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    // length in characters, not bytes
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl AsRef<str> for LogExcerpt {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for LogExcerpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// Same boundaries as Python's str.splitlines; a CR LF pair leaves an empty
// segment between the two, which the relevance filter drops
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Case-insensitive check for "error" or "warning"
pub fn is_relevant_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Keep only error/warning lines (in order), join with newlines and cut to the budget
pub fn extract_excerpt(text: &str) -> LogExcerpt {
    let selected: Vec<&str> = text.split(LINE_BREAKS).filter(|l| is_relevant_line(l)).collect();
    let matched_lines = selected.len();
    let mut joined = selected.join("\n");

    let truncated = match joined.char_indices().nth(EXCERPT_CHAR_BUDGET) {
        Some((cut, _)) => {
            joined.truncate(cut);
            true
        }
        None => false,
    };

    LogExcerpt {
        text: joined,
        matched_lines,
        truncated,
    }
}

/// Decode uploaded bytes as UTF-8 and extract the excerpt
pub fn excerpt_from_bytes(bytes: &[u8]) -> Result<LogExcerpt, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(extract_excerpt(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevant_line() {
        assert!(is_relevant_line("ERROR disk full"));
        assert!(is_relevant_line("Warning: low memory"));
        assert!(is_relevant_line("interface eth0 reported an Error"));
        assert!(!is_relevant_line("INFO start"));
        assert!(!is_relevant_line("WARN short form is not matched"));
    }

    #[test]
    fn test_truncation_counts_characters() {
        // multi-byte chars must not be split
        let line = format!("error {}", "é".repeat(EXCERPT_CHAR_BUDGET));
        let excerpt = extract_excerpt(&line);
        assert!(excerpt.truncated());
        assert_eq!(excerpt.char_len(), EXCERPT_CHAR_BUDGET);
        assert_eq!(excerpt.matched_lines(), 1);
    }

    #[test]
    fn test_unicode_line_separators() {
        let raw = "info a\u{2028}error b\x0cwarning c\u{85}plain d";
        let excerpt = extract_excerpt(raw);
        assert_eq!(excerpt.as_str(), "error b\nwarning c");
        assert_eq!(excerpt.matched_lines(), 2);
    }

    #[test]
    fn test_exact_budget_not_truncated() {
        let line = format!("error{}", "x".repeat(EXCERPT_CHAR_BUDGET - 5));
        let excerpt = extract_excerpt(&line);
        assert!(!excerpt.truncated());
        assert_eq!(excerpt.char_len(), EXCERPT_CHAR_BUDGET);
    }
}
