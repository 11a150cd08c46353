use crate::constant::{COMMENT_END, COMMENT_START, LINE_ENDING, MAX_TAB_WIDTH};

/// Remove every marked comment span (markers included) from a line.
///
/// An unterminated comment start leaves the rest of the text untouched,
/// matching how filters mark comments that run to the end of the file.
pub fn strip_comments(text: &str) -> String {
    if !text.contains(COMMENT_START) {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(beg) = rest.find(COMMENT_START) {
        let Some(len) = rest[beg..].find(COMMENT_END) else {
            break;
        };
        result.push_str(&rest[..beg]);
        rest = &rest[beg + len + COMMENT_END.len_utf8()..];
    }
    result.push_str(rest);
    result
}

/// Remove the marker characters but keep the comment text
pub fn strip_markers(text: &str) -> String {
    text.chars()
        .filter(|c| *c != COMMENT_START && *c != COMMENT_END)
        .collect()
}

/// Collapse whitespace runs to a single space and trim both ends.
/// Marker characters count as whitespace.
pub fn canonicalize_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == COMMENT_START || c == COMMENT_END)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert `\r\n` (or, when none are present, lone `\r`) line endings to `\n`
pub fn canonicalize_line_endings(text: &str) -> String {
    if text.contains("\r\n") {
        text.replace("\r\n", "\n")
    } else {
        text.replace('\r', "\n")
    }
}

/// Split highlighted text into lines.
///
/// A comment that spans several lines is closed at the end of each line and
/// reopened at the start of the next, so every line is self-contained.
/// A trailing line ending does not produce an empty last line.
pub fn break_lines(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut in_comment = false;

    let mut pieces: Vec<&str> = text.split(LINE_ENDING).collect();
    if pieces.last().is_some_and(|last| last.is_empty()) {
        pieces.pop();
    }

    for piece in pieces {
        let mut line = String::with_capacity(piece.len() + 2);
        if in_comment {
            line.push(COMMENT_START);
        }
        line.push_str(piece);

        let start = line.rfind(COMMENT_START);
        let end = line.rfind(COMMENT_END);
        match (start, end) {
            (Some(s), Some(e)) => in_comment = s > e,
            (Some(_), None) => in_comment = true,
            (None, Some(_)) => in_comment = false,
            (None, None) => {}
        }

        if in_comment {
            line.push(COMMENT_END);
        }
        result.push(line);
    }

    result
}

/// Expand tabs to spaces, ignoring marker characters when computing columns
pub fn tabs_to_spaces(text: &str, tab_width: usize) -> String {
    let tab_width = tab_width.clamp(1, MAX_TAB_WIDTH);
    let mut result = String::with_capacity(text.len());
    let mut column = 0usize;

    for c in text.chars() {
        match c {
            '\t' => {
                let spaces = tab_width - (column % tab_width);
                result.extend(std::iter::repeat_n(' ', spaces));
                column += spaces;
            }
            '\n' | '\r' => {
                result.push(c);
                column = 0;
            }
            COMMENT_START | COMMENT_END => result.push(c),
            _ => {
                result.push(c);
                column += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(s: &str) -> String {
        s.replace('{', &COMMENT_START.to_string())
            .replace('}', &COMMENT_END.to_string())
    }

    #[test]
    fn strip_comments_removes_marked_spans() {
        assert_eq!(strip_comments(&marked("code(); {// note}")), "code(); ");
        assert_eq!(strip_comments(&marked("a {/*x*/} b {/*y*/}")), "a  b ");
        assert_eq!(strip_comments("plain"), "plain");
    }

    #[test]
    fn strip_comments_keeps_unterminated_span() {
        let text = marked("a {// open");
        assert_eq!(strip_comments(&text), text);
    }

    #[test]
    fn whitespace_is_canonicalized() {
        assert_eq!(canonicalize_whitespace("  foo \t  bar  "), "foo bar");
        assert_eq!(canonicalize_whitespace(&marked("x{//c}")), "x //c");
        assert_eq!(canonicalize_whitespace("   "), "");
    }

    #[test]
    fn line_endings_are_canonicalized() {
        assert_eq!(canonicalize_line_endings("a\r\nb\r\n"), "a\nb\n");
        assert_eq!(canonicalize_line_endings("a\rb\r"), "a\nb\n");
    }

    #[test]
    fn multi_line_comments_are_closed_per_line() {
        let text = marked("int a; {/* one\ntwo\nthree */}\nint b;\n");
        let lines = break_lines(&text);
        assert_eq!(
            lines,
            vec![
                marked("int a; {/* one}"),
                marked("{two}"),
                marked("{three */}"),
                "int b;".to_string(),
            ]
        );
    }

    #[test]
    fn trailing_newline_does_not_add_line() {
        assert_eq!(break_lines("a\nb\n").len(), 2);
        assert_eq!(break_lines("a\nb").len(), 2);
        assert_eq!(break_lines("a\n\n").len(), 2);
        assert!(break_lines("").is_empty());
    }

    #[test]
    fn tabs_ignore_markers_for_columns() {
        assert_eq!(tabs_to_spaces("ab\tc", 4), "ab  c");
        let text = marked("{ab}\tc");
        assert_eq!(strip_markers(&tabs_to_spaces(&text, 4)), "ab  c");
    }
}
