use super::comment::{canonicalize_whitespace, strip_comments, strip_markers};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One line of text that compares equal to another line when both differ
/// only in whitespace. The exact text is kept for output.
#[derive(Debug, Clone)]
pub struct LineComparable {
    text: String,
    normalized: String,
}

impl LineComparable {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = canonicalize_whitespace(&text);
        Self { text, normalized }
    }

    /// A comparable built from this line's code only, with comments removed
    pub fn without_comments(&self) -> Self {
        Self::new(strip_comments(&self.text))
    }

    /// The exact text, comment markers included
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text as it should be shown to a reader
    pub fn visible(&self) -> String {
        strip_markers(&self.text)
    }
}

impl PartialEq for LineComparable {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for LineComparable {}

impl PartialOrd for LineComparable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineComparable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl Hash for LineComparable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for LineComparable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for LineComparable {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for LineComparable {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Wrap a list of raw lines for diffing
pub fn to_comparables<I, S>(lines: I) -> Vec<LineComparable>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines.into_iter().map(LineComparable::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{COMMENT_END, COMMENT_START};

    #[test]
    fn whitespace_differences_compare_equal() {
        assert_eq!(LineComparable::from("foo"), LineComparable::from("foo "));
        assert_eq!(
            LineComparable::from("\tif (x)  {"),
            LineComparable::from("    if (x) {")
        );
        assert_ne!(LineComparable::from("foo").text(), LineComparable::from("foo ").text());
    }

    #[test]
    fn ordering_ignores_whitespace() {
        assert_eq!(
            LineComparable::from("  a   b").cmp(&LineComparable::from("a b	")),
            Ordering::Equal
        );
        assert!(LineComparable::from("a") < LineComparable::from("b"));
    }

    #[test]
    fn different_characters_never_compare_equal() {
        assert_ne!(LineComparable::from("foo"), LineComparable::from("f oo"));
        assert_ne!(LineComparable::from("a+b"), LineComparable::from("a-b"));
    }

    #[test]
    fn comments_can_be_ignored() {
        let v1 = LineComparable::new(format!("code(); {COMMENT_START}// v1{COMMENT_END}"));
        let v2 = LineComparable::new(format!("code(); {COMMENT_START}// v2{COMMENT_END}"));
        assert_ne!(v1, v2);
        assert_eq!(v1.without_comments(), v2.without_comments());
        assert_eq!(v1.visible(), "code(); // v1");
    }
}
