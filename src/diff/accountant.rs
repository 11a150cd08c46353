use super::comment::strip_comments;
use super::hunk::{DiffAlgorithm, edit_script};
use super::line::LineComparable;
use super::redline::{Block, Line};
use super::types::{AccountingType, DiffFragment, LocCounts};
use crate::filter::LanguageFilter;

/// Count the lines that are significant once their comments are removed
pub fn count_significant<'a, I>(filter: &dyn LanguageFilter, lines: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| filter.is_significant(&strip_comments(line)))
        .count()
}

/// Turns redline blocks into LOC counts and diff fragments
pub struct LocAccountant<'f> {
    filter: &'f dyn LanguageFilter,
    algorithm: DiffAlgorithm,
    counts: LocCounts,
    fragments: Vec<DiffFragment>,
    /// Lines of the final version passed so far
    final_line: usize,
}

impl<'f> LocAccountant<'f> {
    pub fn new(filter: &'f dyn LanguageFilter, algorithm: DiffAlgorithm) -> Self {
        Self {
            filter,
            algorithm,
            counts: LocCounts::default(),
            fragments: Vec::new(),
            final_line: 0,
        }
    }

    pub fn finish(self) -> (LocCounts, Vec<DiffFragment>) {
        (self.counts, self.fragments)
    }

    pub fn account_all<'a>(&mut self, blocks: impl IntoIterator<Item = Block<'a>>) {
        for block in blocks {
            self.account(&block);
        }
    }

    /// Add one block's lines to the counts and emit its fragment
    pub fn account(&mut self, block: &Block<'_>) {
        match *block {
            Block::Base(lines) => {
                let n = self.significant(lines);
                self.counts.add(AccountingType::Base, n);
                self.counts.add(AccountingType::Total, n);
            }
            Block::Deleted(lines) => {
                let n = self.significant(lines);
                self.counts.add(AccountingType::Base, n);
                self.counts.add(AccountingType::Deleted, n);
                self.push_fragment(AccountingType::Deleted, lines, &[]);
            }
            Block::Added(lines) => {
                let n = self.significant(lines);
                self.counts.add(AccountingType::Added, n);
                self.counts.add(AccountingType::Total, n);
                self.push_fragment(AccountingType::Added, &[], lines);
            }
            Block::Replace { deleted, added } => {
                self.account_replace(deleted, added);
                self.push_fragment(AccountingType::Modified, deleted, added);
            }
        }
        self.final_line += block.surviving_len();
    }

    /// Pair deleted and added lines through a second, comment-insensitive
    /// diff. Within each hunk the shorter side is absorbed into Modified and
    /// the excess goes to Deleted or Added.
    fn account_replace(&mut self, deleted: &[Line], added: &[Line]) {
        let old = Self::code_only(deleted);
        let new = Self::code_only(added);

        self.counts.add(AccountingType::Base, self.significant_code(&old));
        self.counts.add(AccountingType::Total, self.significant_code(&new));

        for hunk in edit_script(&old, &new, self.algorithm) {
            let d = self.significant_code(&old[hunk.start_a..hunk.end_a()]);
            let a = self.significant_code(&new[hunk.start_b..hunk.end_b()]);
            let m = d.min(a);
            self.counts.add(AccountingType::Modified, m);
            self.counts.add(AccountingType::Deleted, d - m);
            self.counts.add(AccountingType::Added, a - m);
        }
    }

    fn code_only(lines: &[Line]) -> Vec<LineComparable> {
        lines
            .iter()
            .map(|line| line.text().without_comments())
            .collect()
    }

    fn significant(&self, lines: &[Line]) -> usize {
        count_significant(self.filter, lines.iter().map(|line| line.text().text()))
    }

    fn significant_code(&self, code: &[LineComparable]) -> usize {
        code.iter()
            .filter(|line| self.filter.is_significant(line.text()))
            .count()
    }

    fn push_fragment(&mut self, kind: AccountingType, old: &[Line], new: &[Line]) {
        let visible = |lines: &[Line]| -> Vec<String> {
            lines.iter().map(|line| line.text().visible()).collect()
        };
        self.fragments.push(DiffFragment {
            kind,
            start_line: self.final_line + 1,
            old_text: visible(old),
            new_text: visible(new),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{COMMENT_END, COMMENT_START};
    use crate::diff::line::to_comparables;
    use crate::diff::redline::RedlinedDocument;
    use crate::filter::DefaultFilter;
    use crate::filter::builtin::c_family;
    use crate::filter::configurable::ConfigurableLanguageFilter;

    /// A document holding one replace block, `old` replaced by `new`
    fn replace_document(old: &[&str], new: &[&str]) -> RedlinedDocument {
        let mut document = RedlinedDocument::initialize(to_comparables(old.iter().copied()));
        let next = to_comparables(new.iter().copied());
        document
            .apply_change(0, old.len(), &next, 0, new.len(), true)
            .unwrap();
        document
    }

    fn account(document: &RedlinedDocument, filter: &dyn LanguageFilter) -> (LocCounts, Vec<DiffFragment>) {
        let mut accountant = LocAccountant::new(filter, DiffAlgorithm::Myers);
        accountant.account_all(document.get_blocks());
        accountant.finish()
    }

    #[test]
    fn replace_block_pairs_changed_lines() {
        let document = replace_document(&["x=1;", "y=2;"], &["x=1;", "y=3;"]);
        let (counts, fragments) = account(&document, &DefaultFilter);
        assert_eq!(counts.modified, 1);
        assert_eq!(counts.added, 0);
        assert_eq!(counts.deleted, 0);
        assert_eq!(counts.base, 2);
        assert_eq!(counts.total, 2);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].kind, AccountingType::Modified);
    }

    #[test]
    fn longer_side_keeps_the_excess() {
        let document = replace_document(
            &["a1", "a2", "a3"],
            &["b1", "b2", "b3", "b4", "b5"],
        );
        let (counts, _) = account(&document, &DefaultFilter);
        assert_eq!(counts.modified, 3);
        assert_eq!(counts.added, 2);
        assert_eq!(counts.deleted, 0);
        assert!(counts.is_balanced());
    }

    #[test]
    fn comment_only_change_counts_nothing() {
        let v1 = format!("code(); {COMMENT_START}// v1{COMMENT_END}");
        let v2 = format!("code(); {COMMENT_START}// v2{COMMENT_END}");
        let document = replace_document(&[&v1], &[&v2]);
        let filter = ConfigurableLanguageFilter::new(&c_family()).unwrap();
        let (counts, fragments) = account(&document, &filter);
        assert_eq!(counts.modified + counts.added + counts.deleted, 0);
        assert_eq!(counts.base, 1);
        assert_eq!(counts.total, 1);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].old_text, vec!["code(); // v1".to_string()]);
        assert_eq!(fragments[0].new_text, vec!["code(); // v2".to_string()]);
    }

    #[test]
    fn insignificant_lines_count_zero_but_are_shown() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a;"]));
        let next = to_comparables(["a;", "", "}", "b;"]);
        document.apply_change(1, 0, &next, 1, 3, true).unwrap();

        let filter = ConfigurableLanguageFilter::new(&c_family()).unwrap();
        let (counts, fragments) = account(&document, &filter);
        assert_eq!(counts.added, 1);
        assert_eq!(counts.total, 2);
        assert_eq!(fragments[0].new_text.len(), 3);
        assert_eq!(fragments[0].start_line, 2);
    }

    #[test]
    fn fragment_positions_follow_final_version() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b", "c", "d"]));
        let next = to_comparables(["a", "c", "x"]);
        document.apply_change(1, 1, &next, 1, 0, true).unwrap();
        document.apply_change(3, 1, &next, 2, 1, true).unwrap();

        let (counts, fragments) = account(&document, &DefaultFilter);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].kind, AccountingType::Deleted);
        assert_eq!(fragments[0].start_line, 2);
        assert_eq!(fragments[1].kind, AccountingType::Modified);
        assert_eq!(fragments[1].start_line, 3);
        assert_eq!(counts.base, 4);
        assert_eq!(counts.deleted, 1);
        assert_eq!(counts.modified, 1);
        assert_eq!(counts.total, 3);
        assert!(counts.is_balanced());
    }
}
