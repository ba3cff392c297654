//! The `#:schema <url>` in-document directive.

use once_cell::sync::Lazy;
use regex::Regex;

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*#:schema\s+(\S+)").expect("directive pattern is valid")
});

/// Scan a document for a schema directive. First match wins; the directive
/// may appear on any line. This is the only in-band configuration surface
/// and always overrides catalog matching.
pub fn schema_directive(text: &str) -> Option<&str> {
    DIRECTIVE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|url| url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_directive_on_any_line() {
        let text = "# a comment\n  #:schema https://example.com/s.json\na = 1\n";
        assert_eq!(
            schema_directive(text),
            Some("https://example.com/s.json")
        );
    }

    #[test]
    fn first_match_wins() {
        let text = "#:schema file:///one.json\n#:schema file:///two.json\n";
        assert_eq!(schema_directive(text), Some("file:///one.json"));
    }

    #[test]
    fn plain_comments_do_not_match() {
        assert_eq!(schema_directive("# schema: nope\n#: schema nope\n"), None);
        assert_eq!(schema_directive("a = \"#:schema inside\"\n"), None);
    }
}
