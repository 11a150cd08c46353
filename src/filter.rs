//! Language filters decide where comments are and which lines count.
//!
//! A filter marks comment spans in a file's text with
//! [`COMMENT_START`](crate::constant::COMMENT_START) and
//! [`COMMENT_END`](crate::constant::COMMENT_END), and judges whether a
//! comment-free line is a countable line of code.

pub mod builtin;
pub mod configurable;

pub use configurable::{
    CommentSyntax, ConfigurableLanguageFilter, FilterOption, IgnoredLine, LanguageDefinition,
    StringSyntax,
};

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid language definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid ignored line pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Pluggable per-language comment and significance rules
pub trait LanguageFilter: Send + Sync + std::fmt::Debug {
    /// Short name of the language, used by the `-lang=` option
    fn name(&self) -> &str;

    /// Return a copy of `text` with comment spans bracketed by markers
    fn highlight_syntax(&self, text: &str) -> String;

    /// Whether a comment-free line counts toward LOC
    fn is_significant(&self, line: &str) -> bool {
        !line.trim().is_empty()
    }

    /// Score how well this filter fits a file; zero means no match
    fn language_matches(&self, filename: &str, contents: &str, options: &str) -> u32;

    /// A filter with per-analysis options applied
    fn configured(&self, options: &str) -> Arc<dyn LanguageFilter>;
}

/// Fallback filter: no comment syntax, every nonblank line counts
#[derive(Debug, Clone, Default)]
pub struct DefaultFilter;

impl LanguageFilter for DefaultFilter {
    fn name(&self) -> &str {
        "default"
    }

    fn highlight_syntax(&self, text: &str) -> String {
        text.to_string()
    }

    fn language_matches(&self, _filename: &str, _contents: &str, options: &str) -> u32 {
        if lang_option(options).is_some_and(|lang| lang.eq_ignore_ascii_case(self.name())) {
            1000
        } else {
            0
        }
    }

    fn configured(&self, _options: &str) -> Arc<dyn LanguageFilter> {
        Arc::new(self.clone())
    }
}

/// Pick the best filter for a file, falling back to [`DefaultFilter`]
pub fn select_filter(
    filters: &[Arc<dyn LanguageFilter>],
    filename: &str,
    contents: &str,
    options: &str,
) -> Arc<dyn LanguageFilter> {
    let mut best: Option<(&Arc<dyn LanguageFilter>, u32)> = None;
    for filter in filters {
        let rating = filter.language_matches(filename, contents, options);
        if rating > 0 && best.is_none_or(|(_, best_rating)| rating > best_rating) {
            best = Some((filter, rating));
        }
    }

    match best {
        Some((filter, rating)) => {
            debug!("Selected filter {} for {} (rating {})", filter.name(), filename, rating);
            filter.configured(options)
        }
        None => {
            debug!("No language filter matched {}, using default", filename);
            Arc::new(DefaultFilter)
        }
    }
}

/// Look through an option string for the value following `tag`.
///
/// Accepts both `tag=value` and `tag value`; the last occurrence wins.
pub fn get_option<'a>(options: &'a str, tag: &str) -> Option<&'a str> {
    let tag_pos = options.rfind(tag)?;
    let value_pos = tag_pos + tag.len() + 1;
    if value_pos >= options.len() || !options.is_char_boundary(value_pos) {
        return None;
    }
    let value = &options[value_pos..];
    Some(value.split(' ').next().unwrap_or(value))
}

/// The language forced through a `-lang=<name>` option, if any
pub fn lang_option(options: &str) -> Option<&str> {
    get_option(options, "-lang").filter(|lang| !lang.is_empty())
}

/// The tab width requested through a `-tabWidth=<n>` option, if any
pub fn tab_width_option(options: &str) -> Option<usize> {
    let lower = options.to_ascii_lowercase();
    let pos = lower.rfind("-tabwidth=")?;
    let digits: String = options[pos + "-tabwidth=".len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
