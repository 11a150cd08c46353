use super::{
    CommentSyntax, ConfigurableLanguageFilter, FilterOption, IgnoredLine, LanguageDefinition,
    LanguageFilter, StringSyntax,
};
use std::sync::Arc;
use tracing::warn;

fn comment(begin: &str, end: &str) -> CommentSyntax {
    CommentSyntax {
        begins_with: begin.to_string(),
        ends_with: end.to_string(),
    }
}

fn delimited(delimiter: &str, escape: Option<char>) -> StringSyntax {
    StringSyntax {
        delimiter: Some(delimiter.to_string()),
        escape_char: escape,
        ..StringSyntax::default()
    }
}

fn suffixes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Lines made only of braces, brackets and separators
fn punctuation_only() -> (IgnoredLine, FilterOption) {
    (
        IgnoredLine {
            reg_exp: Some(r"^[{}()\[\];,]+$".to_string()),
            unless: Some("-countBraces".to_string()),
            ..IgnoredLine::default()
        },
        FilterOption {
            text: "-countBraces".to_string(),
            description: "Count lines containing only braces, brackets or separators".to_string(),
        },
    )
}

/// C, C++, Java, C#, JavaScript and similar brace languages
pub fn c_family() -> LanguageDefinition {
    let (ignored, option) = punctuation_only();
    LanguageDefinition {
        id: "c".to_string(),
        file_suffixes: suffixes(&[
            ".c", ".h", ".cc", ".cpp", ".cxx", ".hpp", ".java", ".cs", ".js", ".ts", ".go",
            ".swift", ".kt", ".scala",
        ]),
        comments: vec![comment("//", "\n"), comment("/*", "*/")],
        strings: vec![delimited("\"", Some('\\')), delimited("'", Some('\\'))],
        options: vec![option],
        ignored_lines: vec![ignored],
        ..LanguageDefinition::default()
    }
}

/// Rust: like C, but `'` starts lifetimes as well as char literals
pub fn rust() -> LanguageDefinition {
    let (ignored, option) = punctuation_only();
    LanguageDefinition {
        id: "rust".to_string(),
        file_suffixes: suffixes(&[".rs"]),
        comments: vec![comment("//", "\n"), comment("/*", "*/")],
        strings: vec![delimited("\"", Some('\\'))],
        options: vec![option],
        ignored_lines: vec![ignored],
        ..LanguageDefinition::default()
    }
}

/// Languages with `#` line comments
pub fn hash_comment() -> LanguageDefinition {
    LanguageDefinition {
        id: "hash".to_string(),
        file_suffixes: suffixes(&[
            ".py", ".sh", ".bash", ".rb", ".pl", ".pm", ".r", ".toml", ".yaml", ".yml", ".mk",
        ]),
        comments: vec![comment("#", "\n")],
        strings: vec![delimited("\"", Some('\\')), delimited("'", Some('\\'))],
        first_lines: vec!["#!".to_string()],
        ..LanguageDefinition::default()
    }
}

pub fn sql() -> LanguageDefinition {
    LanguageDefinition {
        id: "sql".to_string(),
        file_suffixes: suffixes(&[".sql", ".ddl"]),
        comments: vec![comment("--", "\n"), comment("/*", "*/")],
        strings: vec![StringSyntax {
            delimiter: Some("'".to_string()),
            may_include: Some("''".to_string()),
            ..StringSyntax::default()
        }],
        ..LanguageDefinition::default()
    }
}

/// HTML, XML and other angle-bracket markup
pub fn markup() -> LanguageDefinition {
    LanguageDefinition {
        id: "markup".to_string(),
        file_suffixes: suffixes(&[".html", ".htm", ".xhtml", ".xml", ".xsl", ".svg", ".jsp"]),
        comments: vec![comment("<!--", "-->")],
        first_lines: vec!["<?xml".to_string(), "<!DOCTYPE".to_string()],
        ..LanguageDefinition::default()
    }
}

pub fn builtin_definitions() -> Vec<LanguageDefinition> {
    vec![c_family(), rust(), hash_comment(), sql(), markup()]
}

/// Built-in filters, ready for [`select_filter`](super::select_filter)
pub fn builtin_filters() -> Vec<Arc<dyn LanguageFilter>> {
    builtin_definitions()
        .iter()
        .filter_map(|definition| match ConfigurableLanguageFilter::new(definition) {
            Ok(filter) => Some(Arc::new(filter) as Arc<dyn LanguageFilter>),
            Err(e) => {
                warn!("Skipping built-in language {}: {}", definition.id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtins_are_valid() {
        assert_eq!(builtin_filters().len(), builtin_definitions().len());
    }

    #[test]
    fn hash_filter_marks_comments_and_shebangs() {
        let filter = ConfigurableLanguageFilter::new(&hash_comment()).unwrap();
        assert_eq!(filter.language_matches("script", "#!/bin/sh\necho hi\n", ""), 60);
        let marked = filter.highlight_syntax("x = '#not' # yes\n");
        assert!(marked.starts_with("x = '#not' \u{2}# yes"));
    }

    #[test]
    fn rust_lifetimes_do_not_hide_comments() {
        let filter = ConfigurableLanguageFilter::new(&rust()).unwrap();
        let marked = filter.highlight_syntax("fn f<'a>(x: &'a str) {} // note\n");
        assert!(marked.contains("\u{2}// note\u{3}"));
    }
}
