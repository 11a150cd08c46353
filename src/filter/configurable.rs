use super::{FilterError, LanguageFilter, lang_option};
use crate::constant::{COMMENT_END, COMMENT_START};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bonus given to user-defined filters so they win over built-ins
const USER_DEFINED_BONUS: u32 = 10;
const SUFFIX_MATCH: u32 = 100;
const CONTENT_MATCH: u32 = 30;
const FORCED_MATCH: u32 = 1000;

fn line_end() -> String {
    "\n".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSyntax {
    pub begins_with: String,
    /// `\n` (or the two characters `\n`) for comments running to end of line
    #[serde(default = "line_end")]
    pub ends_with: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSyntax {
    /// Shorthand for identical begin and end delimiters
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub begins_with: Option<String>,
    #[serde(default)]
    pub ends_with: Option<String>,
    #[serde(default)]
    pub escape_char: Option<char>,
    /// A sequence that may appear inside the literal without ending it
    #[serde(default)]
    pub may_include: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub text: String,
    #[serde(default)]
    pub description: String,
}

/// Lines matching any of these patterns are not counted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredLine {
    #[serde(default)]
    pub containing: Option<String>,
    #[serde(default)]
    pub beginning_with: Option<String>,
    #[serde(default)]
    pub ending_with: Option<String>,
    #[serde(default)]
    pub equal_to: Option<String>,
    #[serde(default)]
    pub reg_exp: Option<String>,
    /// Only active when this option is given
    #[serde(default, rename = "if")]
    pub if_option: Option<String>,
    /// Active unless this option is given
    #[serde(default)]
    pub unless: Option<String>,
}

/// Declarative description of a language, loadable from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDefinition {
    pub id: String,
    #[serde(default)]
    pub file_suffixes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<CommentSyntax>,
    #[serde(default)]
    pub strings: Vec<StringSyntax>,
    #[serde(default)]
    pub first_lines: Vec<String>,
    #[serde(default)]
    pub options: Vec<FilterOption>,
    #[serde(default)]
    pub ignored_lines: Vec<IgnoredLine>,
}

#[derive(Debug, Clone)]
struct StringRule {
    begin: String,
    end: String,
    escape: Option<char>,
    embed: Option<String>,
}

#[derive(Debug, Clone)]
struct IgnoredRule {
    containing: Option<String>,
    beginning_with: Option<String>,
    ending_with: Option<String>,
    equal_to: Option<String>,
    regex: Option<Regex>,
    if_option: Option<String>,
    unless: Option<String>,
    enabled: bool,
}

impl IgnoredRule {
    fn set_options(&mut self, options: &[&str]) {
        let given = |name: &str| options.iter().any(|opt| opt.eq_ignore_ascii_case(name));
        self.enabled = match (&self.if_option, &self.unless) {
            (Some(name), _) => given(name),
            (None, Some(name)) => !given(name),
            (None, None) => true,
        };
    }

    fn should_ignore(&self, trimmed: &str) -> bool {
        self.enabled
            && (self.containing.as_deref().is_some_and(|s| trimmed.contains(s))
                || self.beginning_with.as_deref().is_some_and(|s| trimmed.starts_with(s))
                || self.ending_with.as_deref().is_some_and(|s| trimmed.ends_with(s))
                || self.equal_to.as_deref().is_some_and(|s| trimmed == s)
                || self.regex.as_ref().is_some_and(|re| re.is_match(trimmed)))
    }
}

/// A language filter driven by a [`LanguageDefinition`]
#[derive(Debug, Clone)]
pub struct ConfigurableLanguageFilter {
    id: String,
    comment_starters: Vec<String>,
    comment_enders: Vec<String>,
    strings: Vec<StringRule>,
    file_suffixes: Vec<String>,
    first_lines: Vec<String>,
    ignored: Vec<IgnoredRule>,
    user_defined: bool,
}

fn unescape_newline(value: &str) -> String {
    if value.is_empty() || value == "\\n" {
        "\n".to_string()
    } else {
        value.to_string()
    }
}

impl ConfigurableLanguageFilter {
    pub fn new(definition: &LanguageDefinition) -> Result<Self, FilterError> {
        if definition.id.trim().is_empty() {
            return Err(FilterError::InvalidDefinition(
                "the id must be specified".to_string(),
            ));
        }

        let mut comment_starters = Vec::new();
        let mut comment_enders = Vec::new();
        for comment in &definition.comments {
            if comment.begins_with.is_empty() {
                return Err(FilterError::InvalidDefinition(format!(
                    "{}: comment syntax is missing begins_with",
                    definition.id
                )));
            }
            comment_starters.push(comment.begins_with.clone());
            comment_enders.push(unescape_newline(&comment.ends_with));
        }

        let mut strings = Vec::new();
        for syntax in &definition.strings {
            let (begin, end) = match (&syntax.delimiter, &syntax.begins_with, &syntax.ends_with) {
                (Some(delim), _, _) if !delim.is_empty() => (delim.clone(), delim.clone()),
                (_, Some(begin), Some(end)) if !begin.is_empty() && !end.is_empty() => {
                    (begin.clone(), end.clone())
                }
                _ => {
                    return Err(FilterError::InvalidDefinition(format!(
                        "{}: string syntax needs a delimiter or both begins_with and ends_with",
                        definition.id
                    )));
                }
            };
            strings.push(StringRule {
                begin,
                end,
                escape: syntax.escape_char,
                embed: syntax
                    .may_include
                    .as_deref()
                    .filter(|embed| !embed.is_empty())
                    .map(unescape_newline),
            });
        }

        let mut ignored = Vec::new();
        for rule in &definition.ignored_lines {
            let regex = rule.reg_exp.as_deref().map(Regex::new).transpose()?;
            let mut rule = IgnoredRule {
                containing: rule.containing.clone(),
                beginning_with: rule.beginning_with.clone(),
                ending_with: rule.ending_with.clone(),
                equal_to: rule.equal_to.clone(),
                regex,
                if_option: rule.if_option.clone(),
                unless: rule.unless.clone(),
                enabled: false,
            };
            rule.set_options(&[]);
            ignored.push(rule);
        }

        Ok(Self {
            id: definition.id.clone(),
            comment_starters,
            comment_enders,
            strings,
            file_suffixes: definition.file_suffixes.clone(),
            first_lines: definition.first_lines.clone(),
            ignored,
            user_defined: false,
        })
    }

    /// Mark this filter as coming from user configuration
    pub fn user_defined(mut self) -> Self {
        self.user_defined = true;
        self
    }

    /// Apply per-analysis options to the ignored line patterns
    pub fn with_options(&self, options: &str) -> Self {
        let opts: Vec<&str> = options.split_whitespace().collect();
        let mut filter = self.clone();
        for rule in &mut filter.ignored {
            rule.set_options(&opts);
        }
        filter
    }

    fn find_first(text: &str, pos: usize, patterns: &[&str]) -> Option<(usize, usize)> {
        patterns
            .iter()
            .enumerate()
            .filter_map(|(style, pattern)| text[pos..].find(*pattern).map(|i| (pos + i, style)))
            .min_by_key(|(beg, _)| *beg)
    }

    /// Position just past the end of the string literal starting at `beg`.
    /// A literal stops at the end of its line.
    fn find_string_end(&self, text: &str, beg: usize, style: usize) -> Option<usize> {
        let rule = &self.strings[style];
        let mut pos = beg + rule.begin.len();

        while pos < text.len() {
            let rest = &text[pos..];
            if let Some(embed) = rule.embed.as_deref()
                && rest.starts_with(embed)
            {
                pos += embed.len();
            } else if let Some(escape) = rule.escape
                && rest.starts_with(escape)
            {
                pos += escape.len_utf8();
                if let Some(next) = text[pos..].chars().next() {
                    pos += next.len_utf8();
                }
            } else if rest.starts_with('\n') {
                return Some(pos);
            } else if rest.starts_with(rule.end.as_str()) {
                return Some(pos + rule.end.len());
            } else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }

        None
    }

    fn flag_comments(&self, text: &str) -> String {
        if self.comment_starters.is_empty() {
            return text.to_string();
        }
        let starters: Vec<&str> = self.comment_starters.iter().map(String::as_str).collect();
        let string_starters: Vec<&str> = self.strings.iter().map(|s| s.begin.as_str()).collect();

        let mut out = String::with_capacity(text.len() + 16);
        let mut copied = 0usize;
        let mut pos = 0usize;

        'comment: while let Some((beg, style)) = Self::find_first(text, pos, &starters) {
            // Skip comment starters that sit inside string literals
            let mut string_pos = pos;
            while let Some((string_beg, string_style)) =
                Self::find_first(text, string_pos, &string_starters)
            {
                if string_beg >= beg {
                    break;
                }
                match self.find_string_end(text, string_beg, string_style) {
                    None => break,
                    Some(string_end) if string_end <= beg => string_pos = string_end,
                    Some(string_end) => {
                        pos = string_end;
                        continue 'comment;
                    }
                }
            }

            let body = beg + starters[style].len();
            let ender = self.comment_enders[style].as_str();
            let end = text[body..]
                .find(ender)
                .map_or(text.len(), |i| body + i + ender.len());

            out.push_str(&text[copied..beg]);
            out.push(COMMENT_START);
            out.push_str(&text[beg..end]);
            out.push(COMMENT_END);
            copied = end;
            pos = end;
        }
        out.push_str(&text[copied..]);

        out.replace(
            &format!("\n{COMMENT_END}"),
            &format!("{COMMENT_END}\n"),
        )
    }
}

fn ends_with_ignore_case(s: &str, suffix: &str) -> bool {
    s.len() >= suffix.len()
        && s.is_char_boundary(s.len() - suffix.len())
        && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

impl LanguageFilter for ConfigurableLanguageFilter {
    fn name(&self) -> &str {
        &self.id
    }

    fn highlight_syntax(&self, text: &str) -> String {
        self.flag_comments(text)
    }

    fn is_significant(&self, line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty() && !self.ignored.iter().any(|rule| rule.should_ignore(trimmed))
    }

    fn language_matches(&self, filename: &str, contents: &str, options: &str) -> u32 {
        let mut result = 0;

        if self
            .file_suffixes
            .iter()
            .any(|suffix| ends_with_ignore_case(filename, suffix))
        {
            result += SUFFIX_MATCH;
        }

        let contents = contents.trim_start();
        if !contents.is_empty() {
            if self
                .comment_starters
                .iter()
                .any(|starter| starts_with_ignore_case(contents, starter))
            {
                result += CONTENT_MATCH;
            }
            if self.first_lines.iter().any(|line| contents.starts_with(line.as_str())) {
                result += CONTENT_MATCH;
            }
        }

        if lang_option(options).is_some_and(|lang| lang.eq_ignore_ascii_case(&self.id)) {
            result = FORCED_MATCH;
        }

        if result > 0 && self.user_defined {
            result += USER_DEFINED_BONUS;
        }
        result
    }

    fn configured(&self, options: &str) -> Arc<dyn LanguageFilter> {
        Arc::new(self.with_options(options))
    }
}
