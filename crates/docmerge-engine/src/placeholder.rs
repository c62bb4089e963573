use docmerge_model::{Position, TextTarget};
use regex::{Regex, RegexBuilder};

use crate::error::{ComposeError, ComposeResult};

/// Opening (`{v8 name}`) and closing (`{/v8 name}`) template markers.
pub const DEFAULT_PATTERN: &str = r"\{(|/)v8 (.+?)\}";

/// Discovers template markers in element text.
#[derive(Clone, Debug)]
pub struct PlaceholderMatcher {
    regex: Regex,
}

impl PlaceholderMatcher {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).multi_line(true).build()?;
        Ok(Self { regex })
    }

    /// All non-overlapping markers in `text`, or `None` when there are none.
    pub fn discover(&self, text: &str) -> Option<Vec<String>> {
        let found: Vec<String> = self
            .regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();

        if found.is_empty() {
            None
        } else {
            Some(found)
        }
    }
}

impl Default for PlaceholderMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN).expect("default placeholder pattern compiles")
    }
}

/// Locates the single occurrence an image substitution acts on.
pub fn locate_placeholder<T>(target: &T, pattern: &str) -> ComposeResult<Position>
where
    T: TextTarget + ?Sized,
{
    if pattern.is_empty() {
        return Err(ComposeError::EmptySearchPattern);
    }

    target
        .locate(pattern)
        .ok_or_else(|| ComposeError::PlaceholderNotFound {
            pattern: pattern.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmerge_model::Paragraph;

    #[test]
    fn discovers_opening_and_closing_markers() {
        let matcher = PlaceholderMatcher::default();
        let found = matcher.discover("{v8 name} body {/v8 name}").unwrap();
        assert_eq!(found, vec!["{v8 name}", "{/v8 name}"]);
    }

    #[test]
    fn returns_none_without_markers() {
        let matcher = PlaceholderMatcher::default();
        assert!(matcher.discover("plain text").is_none());
        assert!(matcher.discover("").is_none());
    }

    #[test]
    fn matching_is_case_sensitive_and_delimited() {
        let matcher = PlaceholderMatcher::default();
        assert!(matcher.discover("{V8 name}").is_none());
        assert!(matcher.discover("v8 name").is_none());
        assert!(matcher.discover("{v8name}").is_none());
        assert!(matcher.discover("{v8 }").is_none());
    }

    #[test]
    fn lazy_match_stops_at_first_brace() {
        let matcher = PlaceholderMatcher::default();
        let found = matcher.discover("{v8 a} and {v8 b}").unwrap();
        assert_eq!(found, vec!["{v8 a}", "{v8 b}"]);
    }

    #[test]
    fn markers_on_separate_lines() {
        let matcher = PlaceholderMatcher::default();
        let found = matcher.discover("{v8 first}\n{v8 second}").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn locate_reports_missing_pattern() {
        let paragraph = Paragraph::from_text("Hello");
        let err = locate_placeholder(&paragraph, "{v8 logo}").unwrap_err();
        assert!(matches!(err, ComposeError::PlaceholderNotFound { .. }));

        let err = locate_placeholder(&paragraph, "").unwrap_err();
        assert!(matches!(err, ComposeError::EmptySearchPattern));
    }
}
