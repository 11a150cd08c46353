//! Per-file driver: loads every version of a file, folds them into a
//! redlined document and produces a [`DiffResult`].

use crate::constant::{BINARY_SNIFF_LEN, DEFAULT_TAB_WIDTH, MAX_TAB_WIDTH};
use crate::diff::applier::FoldError;
use crate::diff::comment::{break_lines, canonicalize_line_endings, tabs_to_spaces};
use crate::diff::{
    AccountingType, CommentOnlyPolicy, DiffAlgorithm, DiffError, DiffResult,
    FileChangeClassifier, LineComparable, LocAccountant, PairwiseDiffApplier, RedlinedDocument,
};
use crate::filter::builtin::builtin_filters;
use crate::filter::{LanguageFilter, select_filter, tab_width_option};
use crate::source::{SourceError, VersionId, VersionSource};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Version source error: {0}")]
    Source(#[from] SourceError),

    #[error("{file} is binary at version {version}")]
    Binary { file: String, version: VersionId },

    #[error("{0} has no versions")]
    NoVersions(String),

    #[error("Could not fold version {version} of {file}: {source}")]
    Fold {
        file: String,
        version: usize,
        #[source]
        source: FoldError,
    },

    #[error("Could not finalize {file}: {source}")]
    Finalize {
        file: String,
        #[source]
        source: DiffError,
    },
}

/// Analyzes the version history of one file at a time
#[derive(Debug, Clone)]
pub struct FileAnalyzer {
    filters: Vec<Arc<dyn LanguageFilter>>,
    algorithm: DiffAlgorithm,
    classifier: FileChangeClassifier,
    options: String,
    tab_width: usize,
}

impl FileAnalyzer {
    pub fn new(filters: Vec<Arc<dyn LanguageFilter>>) -> Self {
        Self {
            filters,
            algorithm: DiffAlgorithm::default(),
            classifier: FileChangeClassifier::default(),
            options: String::new(),
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }

    pub fn with_algorithm(mut self, algorithm: DiffAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_policy(mut self, policy: CommentOnlyPolicy) -> Self {
        self.classifier = FileChangeClassifier::new(policy);
        self
    }

    /// Option string passed to filter selection, e.g. `-lang=c -tabWidth=4`
    pub fn with_options(mut self, options: &str) -> Self {
        self.options = options.trim().to_string();
        self
    }

    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// Tab width for rendering; an option in the option string wins
    pub fn tab_width(&self) -> usize {
        tab_width_option(&self.options)
            .unwrap_or(self.tab_width)
            .clamp(1, MAX_TAB_WIDTH)
    }

    /// Run the full analysis of `file` over every version `source` holds
    pub fn analyze(
        &self,
        source: &dyn VersionSource,
        file: &str,
    ) -> Result<DiffResult, AnalysisError> {
        let versions = source.versions(file)?;
        if versions.is_empty() {
            return Err(AnalysisError::NoVersions(file.to_string()));
        }

        let (filter, mut newest) = self.choose_filter(source, file, &versions)?;
        let last_exists = newest.index == Some(versions.len() - 1);

        let first_text = self.fetch(source, file, &versions, 0, &mut newest)?;
        let macro_type = match (first_text.is_some(), last_exists) {
            (false, true) => AccountingType::Added,
            (true, false) => AccountingType::Deleted,
            _ => AccountingType::Base,
        };

        let mut current = Self::to_lines(filter.as_ref(), first_text.as_deref());
        let mut document = RedlinedDocument::initialize(current.clone());
        let mut applier = PairwiseDiffApplier::new(self.algorithm);

        for index in 1..versions.len() {
            let text = self.fetch(source, file, &versions, index, &mut newest)?;
            let next = Self::to_lines(filter.as_ref(), text.as_deref());
            applier
                .fold(&mut document, &next)
                .map_err(|source| AnalysisError::Fold {
                    file: file.to_string(),
                    version: index,
                    source,
                })?;
            current = next;
        }

        document
            .update_content(&current)
            .map_err(|source| AnalysisError::Finalize {
                file: file.to_string(),
                source,
            })?;

        let mut accountant = LocAccountant::new(filter.as_ref(), self.algorithm);
        accountant.account_all(document.get_blocks());
        let (counts, fragments) = accountant.finish();
        let change_type = self.classifier.classify(macro_type, &counts, &fragments);

        let tab_width = self.tab_width();
        let mut redlines = document.render();
        for line in &mut redlines {
            line.content = tabs_to_spaces(&line.content, tab_width);
        }

        info!(
            "Analyzed {} over {} versions with filter {}: {} (base {}, deleted {}, modified {}, added {}, total {})",
            file,
            versions.len(),
            filter.name(),
            change_type,
            counts.base,
            counts.deleted,
            counts.modified,
            counts.added,
            counts.total
        );

        Ok(DiffResult {
            filename: file.to_string(),
            filter_name: filter.name().to_string(),
            change_type,
            counts,
            fragments,
            redlines,
        })
    }

    /// Select the filter from the newest version that exists
    fn choose_filter(
        &self,
        source: &dyn VersionSource,
        file: &str,
        versions: &[VersionId],
    ) -> Result<(Arc<dyn LanguageFilter>, NewestVersion), AnalysisError> {
        for (index, version) in versions.iter().enumerate().rev() {
            if let Some(text) = self.load(source, file, version)? {
                let filter = select_filter(&self.filters, file, &text, &self.options);
                let newest = NewestVersion {
                    index: Some(index),
                    text: Some(text),
                };
                return Ok((filter, newest));
            }
        }
        let filter = select_filter(&self.filters, file, "", &self.options);
        Ok((filter, NewestVersion::default()))
    }

    /// Text of version `index`, reusing what filter selection already read
    fn fetch(
        &self,
        source: &dyn VersionSource,
        file: &str,
        versions: &[VersionId],
        index: usize,
        newest: &mut NewestVersion,
    ) -> Result<Option<String>, AnalysisError> {
        match newest.index {
            Some(n) if index == n => Ok(newest.text.take()),
            Some(n) if index < n => self.load(source, file, &versions[index]),
            _ => Ok(None),
        }
    }

    /// Fetch and decode one version; `None` if the file is absent there
    fn load(
        &self,
        source: &dyn VersionSource,
        file: &str,
        version: &str,
    ) -> Result<Option<String>, AnalysisError> {
        let Some(bytes) = source.content(file, version)? else {
            debug!("{} does not exist at version {}", file, version);
            return Ok(None);
        };

        if is_binary(&bytes) {
            return Err(AnalysisError::Binary {
                file: file.to_string(),
                version: version.to_string(),
            });
        }
        Ok(Some(decode(bytes)))
    }

    fn to_lines(filter: &dyn LanguageFilter, text: Option<&str>) -> Vec<LineComparable> {
        let Some(text) = text else {
            return Vec::new();
        };
        let marked = filter.highlight_syntax(&canonicalize_line_endings(text));
        break_lines(&marked)
            .into_iter()
            .map(LineComparable::new)
            .collect()
    }
}

/// The newest existing version, read once while choosing the filter.
/// Every version after it is known to be absent.
#[derive(Debug, Default)]
struct NewestVersion {
    index: Option<usize>,
    text: Option<String>,
}

impl Default for FileAnalyzer {
    fn default() -> Self {
        Self::new(builtin_filters())
    }
}

/// Content with a NUL byte near the start is treated as binary
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Decode as UTF-8, falling back to ISO-8859-1
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
