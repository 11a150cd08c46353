use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};
use std::fmt;
use std::hash::Hash;

/// One contiguous edit: `delete_count` lines of the old sequence starting at
/// `start_a` are replaced by `insert_count` lines of the new sequence
/// starting at `start_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub start_a: usize,
    pub delete_count: usize,
    pub start_b: usize,
    pub insert_count: usize,
}

impl Hunk {
    pub fn end_a(&self) -> usize {
        self.start_a + self.delete_count
    }

    pub fn end_b(&self) -> usize {
        self.start_b + self.insert_count
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-{},{} +{},{}",
            self.start_a, self.delete_count, self.start_b, self.insert_count
        )
    }
}

/// Diff algorithm used for the minimal edit script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(value: DiffAlgorithm) -> Self {
        match value {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
            DiffAlgorithm::Lcs => Algorithm::Lcs,
        }
    }
}

/// Compute the edit script between two sequences.
///
/// Hunks are returned in increasing, non-overlapping order in both
/// sequences. A deletion directly followed by an insertion at the same spot
/// is reported as one hunk.
pub fn edit_script<T: Hash + Ord>(old: &[T], new: &[T], algorithm: DiffAlgorithm) -> Vec<Hunk> {
    let mut hunks: Vec<Hunk> = Vec::new();

    for op in capture_diff_slices(algorithm.into(), old, new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }

        if let Some(last) = hunks.last_mut()
            && last.end_a() == old_range.start
            && last.end_b() == new_range.start
        {
            last.delete_count += old_range.len();
            last.insert_count += new_range.len();
            continue;
        }

        hunks.push(Hunk {
            start_a: old_range.start,
            delete_count: old_range.len(),
            start_b: new_range.start,
            insert_count: new_range.len(),
        });
    }

    hunks
}
