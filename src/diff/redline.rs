use super::DiffError;
use super::hunk::{DiffAlgorithm, Hunk, edit_script};
use super::line::LineComparable;
use super::types::{RedlineLine, RedlineStatus};

/// Net status of a line relative to the first version of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Base,
    Added,
    Deleted,
}

/// One line of the redlined document
#[derive(Debug, Clone)]
pub struct Line {
    text: LineComparable,
    status: LineStatus,
    /// Parity bit of the fold that last set `status`
    track: bool,
}

impl Line {
    fn base(text: LineComparable) -> Self {
        Self {
            text,
            status: LineStatus::Base,
            track: false,
        }
    }

    pub fn text(&self) -> &LineComparable {
        &self.text
    }

    pub fn status(&self) -> LineStatus {
        self.status
    }

    fn survives(&self) -> bool {
        self.status != LineStatus::Deleted
    }
}

/// A maximal run of lines with a uniform shape
#[derive(Debug, Clone, Copy)]
pub enum Block<'a> {
    Base(&'a [Line]),
    Deleted(&'a [Line]),
    Added(&'a [Line]),
    /// Deleted lines immediately replaced by added lines in the same fold
    Replace {
        deleted: &'a [Line],
        added: &'a [Line],
    },
}

impl Block<'_> {
    /// Number of lines this block contributes to the final version
    pub fn surviving_len(&self) -> usize {
        match self {
            Block::Base(lines) | Block::Added(lines) => lines.len(),
            Block::Deleted(_) => 0,
            Block::Replace { added, .. } => added.len(),
        }
    }
}

/// Hunk position within the fold currently being applied
#[derive(Debug, Clone, Copy, Default)]
struct FoldCursor {
    /// Index into `lines`
    doc: usize,
    /// Surviving lines consumed, in pre-fold coordinates
    old: usize,
    /// Lines of the new version consumed
    new: usize,
    /// Surviving line count when the fold began
    old_len: usize,
}

/// The running multi-version annotated line sequence
#[derive(Debug, Clone, Default)]
pub struct RedlinedDocument {
    lines: Vec<Line>,
    cursor: FoldCursor,
}

impl RedlinedDocument {
    /// Seed a document from the first version; every line starts as Base
    pub fn initialize(lines: Vec<LineComparable>) -> Self {
        let mut document = Self {
            lines: lines.into_iter().map(Line::base).collect(),
            cursor: FoldCursor::default(),
        };
        document.begin_fold();
        document
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn surviving_len(&self) -> usize {
        self.lines.iter().filter(|line| line.survives()).count()
    }

    /// Current content of the document, as seen by the latest version
    pub fn materialize(&self) -> Vec<LineComparable> {
        self.lines
            .iter()
            .filter(|line| line.survives())
            .map(|line| line.text.clone())
            .collect()
    }

    /// Reset the hunk cursor. Hunk positions of the next fold refer to the
    /// content returned by `materialize` at this point.
    pub fn begin_fold(&mut self) {
        self.cursor = FoldCursor {
            old_len: self.surviving_len(),
            ..FoldCursor::default()
        };
    }

    /// Replace `delete_count` surviving lines at `delete_start` with
    /// `new_lines[insert_start..insert_start + insert_count]`.
    ///
    /// Hunks of one fold must be applied in increasing, non-overlapping
    /// order. Base lines being deleted are kept as Deleted; Added lines being
    /// deleted are dropped. Inserted lines that restore previously deleted
    /// lines revive those lines as Base instead of being added.
    pub fn apply_change(
        &mut self,
        delete_start: usize,
        delete_count: usize,
        new_lines: &[LineComparable],
        insert_start: usize,
        insert_count: usize,
        track: bool,
    ) -> Result<(), DiffError> {
        let hunk = Hunk {
            start_a: delete_start,
            delete_count,
            start_b: insert_start,
            insert_count,
        };
        let cursor = self.cursor;

        if delete_start < cursor.old || insert_start < cursor.new {
            return Err(DiffError::InvalidDiffOrder {
                hunk,
                old: cursor.old,
                new: cursor.new,
            });
        }
        if hunk.end_a() > cursor.old_len || hunk.end_b() > new_lines.len() {
            return Err(DiffError::HunkOutOfRange {
                hunk,
                old_len: cursor.old_len,
                new_len: new_lines.len(),
            });
        }
        let out_of_range = || DiffError::HunkOutOfRange {
            hunk,
            old_len: cursor.old_len,
            new_len: new_lines.len(),
        };

        // Walk to the first surviving line of the change
        let mut doc = cursor.doc;
        let mut old = cursor.old;
        while old < delete_start {
            let line = self.lines.get(doc).ok_or_else(out_of_range)?;
            if line.survives() {
                old += 1;
            }
            doc += 1;
        }

        // Mark or drop the deleted lines
        let mut fresh = Vec::new();
        let mut remaining = delete_count;
        while remaining > 0 {
            let line = self.lines.get_mut(doc).ok_or_else(out_of_range)?;
            match line.status {
                LineStatus::Deleted => doc += 1,
                LineStatus::Base => {
                    line.status = LineStatus::Deleted;
                    line.track = track;
                    fresh.push(doc);
                    doc += 1;
                    remaining -= 1;
                }
                LineStatus::Added => {
                    self.lines.remove(doc);
                    remaining -= 1;
                }
            }
        }

        // Pure insertions go after any deleted lines sitting at this spot
        if delete_count == 0 {
            while self
                .lines
                .get(doc)
                .is_some_and(|line| line.status == LineStatus::Deleted)
            {
                doc += 1;
            }
        }

        let inserted = &new_lines[insert_start..hunk.end_b()];
        if !inserted.is_empty() {
            doc = self.insert_or_revive(doc, &fresh, inserted, track);
        }

        self.cursor = FoldCursor {
            doc,
            old: hunk.end_a(),
            new: hunk.end_b(),
            old_len: cursor.old_len,
        };
        Ok(())
    }

    /// Insert `inserted` at `end`. Inserted lines that restore older deleted
    /// lines in the run directly before `end` revive those lines as Base;
    /// the rest are added. Returns the position just past the insertion.
    fn insert_or_revive(
        &mut self,
        end: usize,
        fresh: &[usize],
        inserted: &[LineComparable],
        track: bool,
    ) -> usize {
        let mut run_start = end;
        while run_start > 0 && self.lines[run_start - 1].status == LineStatus::Deleted {
            run_start -= 1;
        }
        let targets = self.revival_targets(run_start, end, fresh, inserted);

        // Unmatched lines go after the deleted lines preceding the next
        // revived line, so deletions still pair with the insertions after them
        let mut region = Vec::with_capacity(end - run_start + inserted.len());
        let mut pending = Vec::new();
        let mut next = run_start;
        for (text, target) in inserted.iter().zip(targets) {
            let line = Line {
                text: text.clone(),
                status: LineStatus::Added,
                track,
            };
            match target {
                Some(index) => {
                    region.extend_from_slice(&self.lines[next..index]);
                    region.append(&mut pending);
                    region.push(Line {
                        status: LineStatus::Base,
                        ..line
                    });
                    next = index + 1;
                }
                None => pending.push(line),
            }
        }
        region.extend_from_slice(&self.lines[next..end]);
        region.append(&mut pending);

        let region_len = region.len();
        self.lines.splice(run_start..end, region);
        run_start + region_len
    }

    /// For each inserted line, the older deleted line in
    /// `run_start..end` it restores, if any
    fn revival_targets(
        &self,
        run_start: usize,
        end: usize,
        fresh: &[usize],
        inserted: &[LineComparable],
    ) -> Vec<Option<usize>> {
        let mut targets = vec![None; inserted.len()];
        let candidates: Vec<usize> = (run_start..end).filter(|i| !fresh.contains(i)).collect();
        if candidates.is_empty() {
            return targets;
        }
        let texts: Vec<LineComparable> = candidates
            .iter()
            .map(|&i| self.lines[i].text.clone())
            .collect();

        let mut pair = |old: usize, new: usize| targets[new] = Some(candidates[old]);
        let (mut old, mut new) = (0, 0);
        for hunk in edit_script(&texts, inserted, DiffAlgorithm::default()) {
            while old < hunk.start_a {
                pair(old, new);
                old += 1;
                new += 1;
            }
            old = hunk.end_a();
            new = hunk.end_b();
        }
        while old < texts.len() {
            pair(old, new);
            old += 1;
            new += 1;
        }
        targets
    }

    /// Resynchronize the exact text of every surviving line with the final
    /// version, repairing whitespace drift ignored during matching.
    pub fn update_content(&mut self, final_lines: &[LineComparable]) -> Result<(), DiffError> {
        let surviving = self.surviving_len();
        if surviving != final_lines.len() {
            return Err(DiffError::SurvivorMismatch {
                surviving,
                expected: final_lines.len(),
            });
        }

        let survivors = self.lines.iter_mut().filter(|line| line.survives());
        for (line, text) in survivors.zip(final_lines) {
            line.text = text.clone();
        }
        self.begin_fold();
        Ok(())
    }

    /// Split the document into maximal uniform blocks. A deleted run directly
    /// followed by an added run from the same fold parity becomes a
    /// `Replace` block.
    pub fn get_blocks(&self) -> Vec<Block<'_>> {
        let mut blocks = Vec::new();
        let mut i = 0usize;

        while i < self.lines.len() {
            let end = self.run_end(i);
            let run = &self.lines[i..end];
            match run[0].status {
                LineStatus::Base => blocks.push(Block::Base(run)),
                LineStatus::Added => blocks.push(Block::Added(run)),
                LineStatus::Deleted => {
                    let paired = self.lines.get(end).is_some_and(|next| {
                        next.status == LineStatus::Added && next.track == run[0].track
                    });
                    if paired {
                        let added_end = self.run_end(end);
                        blocks.push(Block::Replace {
                            deleted: run,
                            added: &self.lines[end..added_end],
                        });
                        i = added_end;
                        continue;
                    }
                    blocks.push(Block::Deleted(run));
                }
            }
            i = end;
        }

        blocks
    }

    /// End of the run that starts at `start`
    fn run_end(&self, start: usize) -> usize {
        let first = &self.lines[start];
        let mut end = start + 1;
        while let Some(line) = self.lines.get(end) {
            let same = line.status == first.status
                && (first.status == LineStatus::Base || line.track == first.track);
            if !same {
                break;
            }
            end += 1;
        }
        end
    }

    /// Visible redline, one entry per line, comment markers removed
    pub fn render(&self) -> Vec<RedlineLine> {
        self.lines
            .iter()
            .map(|line| RedlineLine {
                status: match line.status {
                    LineStatus::Base => RedlineStatus::Unchanged,
                    LineStatus::Added => RedlineStatus::Added,
                    LineStatus::Deleted => RedlineStatus::Deleted,
                },
                content: line.text.visible(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::line::to_comparables;

    fn statuses(document: &RedlinedDocument) -> Vec<(String, LineStatus)> {
        document
            .lines()
            .iter()
            .map(|line| (line.text().text().to_string(), line.status()))
            .collect()
    }

    #[test]
    fn initialize_marks_everything_base() {
        let document = RedlinedDocument::initialize(to_comparables(["a", "b"]));
        assert!(
            document
                .lines()
                .iter()
                .all(|line| line.status() == LineStatus::Base)
        );
        assert_eq!(document.get_blocks().len(), 1);
    }

    #[test]
    fn deleting_base_keeps_history() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b", "c"]));
        let new = to_comparables(["a", "c"]);
        document.apply_change(1, 1, &new, 1, 0, true).unwrap();
        assert_eq!(
            statuses(&document),
            vec![
                ("a".to_string(), LineStatus::Base),
                ("b".to_string(), LineStatus::Deleted),
                ("c".to_string(), LineStatus::Base),
            ]
        );
        assert_eq!(document.materialize(), new);
    }

    #[test]
    fn deleting_added_line_drops_it() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a"]));
        let v2 = to_comparables(["a", "tmp"]);
        document.apply_change(1, 0, &v2, 1, 1, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["a"]);
        document.apply_change(1, 1, &v3, 1, 0, false).unwrap();
        assert_eq!(statuses(&document), vec![("a".to_string(), LineStatus::Base)]);
    }

    #[test]
    fn replace_in_one_hunk_forms_replace_block() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "old", "c"]));
        let new = to_comparables(["a", "new", "c"]);
        document.apply_change(1, 1, &new, 1, 1, true).unwrap();

        let blocks = document.get_blocks();
        assert_eq!(blocks.len(), 3);
        match blocks[1] {
            Block::Replace { deleted, added } => {
                assert_eq!(deleted[0].text().text(), "old");
                assert_eq!(added[0].text().text(), "new");
            }
            other => panic!("expected replace block, got {other:?}"),
        }
    }

    #[test]
    fn changes_from_adjacent_folds_are_not_paired() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b"]));
        let v2 = to_comparables(["a", "b", "c"]);
        document.apply_change(2, 0, &v2, 2, 1, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["a", "c"]);
        document.apply_change(1, 1, &v3, 1, 0, false).unwrap();

        let blocks = document.get_blocks();
        assert!(matches!(blocks[0], Block::Base(_)));
        assert!(matches!(blocks[1], Block::Deleted(_)));
        assert!(matches!(blocks[2], Block::Added(_)));
    }

    #[test]
    fn restoring_deleted_lines_revives_them() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b"]));
        let v2 = to_comparables(["a"]);
        document.apply_change(1, 1, &v2, 1, 0, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["a", "b"]);
        document.apply_change(1, 0, &v3, 1, 1, false).unwrap();

        assert_eq!(
            statuses(&document),
            vec![
                ("a".to_string(), LineStatus::Base),
                ("b".to_string(), LineStatus::Base),
            ]
        );
    }

    #[test]
    fn undoing_a_replacement_revives_the_original() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a"]));
        let v2 = to_comparables(["b"]);
        document.apply_change(0, 1, &v2, 0, 1, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["a"]);
        document.apply_change(0, 1, &v3, 0, 1, false).unwrap();

        assert_eq!(statuses(&document), vec![("a".to_string(), LineStatus::Base)]);
    }

    #[test]
    fn partly_restored_run_revives_matching_lines() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b", "c"]));
        let v2 = to_comparables(["a"]);
        document.apply_change(1, 2, &v2, 1, 0, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["a", "b", "x"]);
        document.apply_change(1, 0, &v3, 1, 2, false).unwrap();

        assert_eq!(
            statuses(&document),
            vec![
                ("a".to_string(), LineStatus::Base),
                ("b".to_string(), LineStatus::Base),
                ("c".to_string(), LineStatus::Deleted),
                ("x".to_string(), LineStatus::Added),
            ]
        );
        assert_eq!(document.materialize(), v3);
    }

    #[test]
    fn restoring_part_of_an_emptied_file() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b"]));
        document.apply_change(0, 2, &[], 0, 0, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["a", "z"]);
        document.apply_change(0, 0, &v3, 0, 2, false).unwrap();

        assert_eq!(
            statuses(&document),
            vec![
                ("a".to_string(), LineStatus::Base),
                ("b".to_string(), LineStatus::Deleted),
                ("z".to_string(), LineStatus::Added),
            ]
        );
        assert_eq!(document.materialize(), v3);
    }

    #[test]
    fn unmatched_lines_before_a_revived_line_keep_their_order() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b"]));
        document.apply_change(0, 2, &[], 0, 0, true).unwrap();

        document.begin_fold();
        let v3 = to_comparables(["n", "b"]);
        document.apply_change(0, 0, &v3, 0, 2, false).unwrap();

        assert_eq!(
            statuses(&document),
            vec![
                ("a".to_string(), LineStatus::Deleted),
                ("n".to_string(), LineStatus::Added),
                ("b".to_string(), LineStatus::Base),
            ]
        );
        assert_eq!(document.materialize(), v3);
    }

    #[test]
    fn out_of_order_hunks_are_rejected() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a", "b", "c", "d"]));
        let new = to_comparables(["a", "c"]);
        document.apply_change(3, 1, &new, 2, 0, true).unwrap();
        let err = document.apply_change(1, 1, &new, 1, 0, true).unwrap_err();
        assert!(matches!(err, DiffError::InvalidDiffOrder { .. }));
    }

    #[test]
    fn out_of_range_hunks_are_rejected() {
        let mut document = RedlinedDocument::initialize(to_comparables(["a"]));
        let new = to_comparables(["a"]);
        let err = document.apply_change(0, 2, &new, 0, 0, true).unwrap_err();
        assert!(matches!(err, DiffError::HunkOutOfRange { .. }));
        let err = document.apply_change(0, 0, &new, 0, 3, true).unwrap_err();
        assert!(matches!(err, DiffError::HunkOutOfRange { .. }));
    }

    #[test]
    fn update_content_repairs_whitespace() {
        let mut document = RedlinedDocument::initialize(to_comparables(["foo", "bar"]));
        document
            .update_content(&to_comparables(["foo ", "bar"]))
            .unwrap();
        assert_eq!(document.lines()[0].text().text(), "foo ");
    }

    #[test]
    fn update_content_rejects_length_mismatch() {
        let mut document = RedlinedDocument::initialize(to_comparables(["foo", "bar"]));
        let err = document
            .update_content(&to_comparables(["foo"]))
            .unwrap_err();
        assert_eq!(
            err,
            DiffError::SurvivorMismatch {
                surviving: 2,
                expected: 1
            }
        );
    }
}
