use super::DiffError;
use super::hunk::{DiffAlgorithm, Hunk, edit_script};
use super::line::LineComparable;
use super::redline::RedlinedDocument;
use thiserror::Error;
use tracing::debug;

/// A fold that could not be applied, with the hunk that broke it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Fold {fold} failed at hunk #{hunk_index}: {source}")]
pub struct FoldError {
    pub fold: usize,
    pub hunk_index: usize,
    #[source]
    pub source: DiffError,
}

/// Folds successive versions into a redlined document
#[derive(Debug, Clone)]
pub struct PairwiseDiffApplier {
    algorithm: DiffAlgorithm,
    folds: usize,
}

impl PairwiseDiffApplier {
    pub fn new(algorithm: DiffAlgorithm) -> Self {
        Self {
            algorithm,
            folds: 0,
        }
    }

    /// Track bit stamped on lines changed by a fold; alternates per fold so
    /// changes from neighbouring versions are never paired as one edit.
    pub fn track_for(fold: usize) -> bool {
        fold % 2 == 0
    }

    /// Diff the document's current content against the next version and
    /// apply the result. Returns the number of hunks applied.
    pub fn fold(
        &mut self,
        document: &mut RedlinedDocument,
        next: &[LineComparable],
    ) -> Result<usize, FoldError> {
        let previous = document.materialize();
        let hunks = edit_script(&previous, next, self.algorithm);
        drop(previous);

        let track = Self::track_for(self.folds);
        self.apply(document, &hunks, next, track)?;

        debug!(
            "Fold {} applied {} hunks ({} lines now surviving)",
            self.folds,
            hunks.len(),
            document.surviving_len()
        );
        self.folds += 1;
        Ok(hunks.len())
    }

    /// Apply an already computed edit script, hunk by hunk, in the order given
    pub fn apply(
        &self,
        document: &mut RedlinedDocument,
        hunks: &[Hunk],
        next: &[LineComparable],
        track: bool,
    ) -> Result<(), FoldError> {
        document.begin_fold();
        for (hunk_index, hunk) in hunks.iter().enumerate() {
            document
                .apply_change(
                    hunk.start_a,
                    hunk.delete_count,
                    next,
                    hunk.start_b,
                    hunk.insert_count,
                    track,
                )
                .map_err(|source| FoldError {
                    fold: self.folds,
                    hunk_index,
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for PairwiseDiffApplier {
    fn default() -> Self {
        Self::new(DiffAlgorithm::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::line::to_comparables;
    use crate::diff::redline::LineStatus;

    fn fold_all(versions: &[&[&str]]) -> RedlinedDocument {
        let mut document = RedlinedDocument::initialize(to_comparables(versions[0].iter().copied()));
        let mut applier = PairwiseDiffApplier::default();
        for version in &versions[1..] {
            let next = to_comparables(version.iter().copied());
            applier.fold(&mut document, &next).unwrap();
        }
        document
    }

    fn status_of(document: &RedlinedDocument, text: &str) -> LineStatus {
        document
            .lines()
            .iter()
            .find(|line| line.text().text() == text)
            .map(|line| line.status())
            .unwrap()
    }

    #[test]
    fn three_version_history_is_composed() {
        let document = fold_all(&[&["a", "b"], &["a", "b", "c"], &["a", "c"]]);
        assert_eq!(status_of(&document, "a"), LineStatus::Base);
        assert_eq!(status_of(&document, "b"), LineStatus::Deleted);
        assert_eq!(status_of(&document, "c"), LineStatus::Added);
        assert_eq!(document.materialize(), to_comparables(["a", "c"]));
    }

    #[test]
    fn added_then_removed_line_leaves_no_trace() {
        let document = fold_all(&[&["a"], &["a", "tmp"], &["a"]]);
        assert_eq!(document.lines().len(), 1);
        assert_eq!(status_of(&document, "a"), LineStatus::Base);
    }

    #[test]
    fn materialized_content_tracks_latest_version() {
        let versions: [&[&str]; 4] = [
            &["fn main() {", "    a();", "}"],
            &["fn main() {", "    a();", "    b();", "}"],
            &["fn main() {", "    c();", "    b();", "}"],
            &["// header", "fn main() {", "    b();", "}"],
        ];
        let document = fold_all(&versions);
        assert_eq!(
            document.materialize(),
            to_comparables(versions[3].iter().copied())
        );
        assert_eq!(status_of(&document, "    a();"), LineStatus::Deleted);
        assert_eq!(status_of(&document, "    b();"), LineStatus::Added);
        assert_eq!(status_of(&document, "// header"), LineStatus::Added);
        assert!(
            document
                .lines()
                .iter()
                .all(|line| line.text().text() != "    c();")
        );
    }

    #[test]
    fn bad_script_reports_fold_and_hunk() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b"]));
        let next = to_comparables(["a"]);
        let hunks = [
            Hunk {
                start_a: 1,
                delete_count: 1,
                start_b: 1,
                insert_count: 0,
            },
            Hunk {
                start_a: 0,
                delete_count: 1,
                start_b: 0,
                insert_count: 0,
            },
        ];
        let applier = PairwiseDiffApplier::default();
        let err = applier.apply(&mut document, &hunks, &next, true).unwrap_err();
        assert_eq!(err.fold, 0);
        assert_eq!(err.hunk_index, 1);
        assert!(matches!(err.source, DiffError::InvalidDiffOrder { .. }));
    }
}
