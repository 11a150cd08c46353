//! Multi-version redline diff and LOC accounting.
//!
//! A [`RedlinedDocument`] is seeded from the first version of a file and
//! every later version is folded into it by the [`PairwiseDiffApplier`].
//! The finished document is split into [`Block`]s, which the
//! [`LocAccountant`] turns into counts and fragments; the
//! [`FileChangeClassifier`] then assigns the file one overall status.

pub mod accountant;
pub mod applier;
pub mod classifier;
pub mod comment;
pub mod hunk;
pub mod line;
pub mod redline;
pub mod types;

pub use accountant::LocAccountant;
pub use applier::PairwiseDiffApplier;
pub use classifier::{CommentOnlyPolicy, FileChangeClassifier};
pub use hunk::{DiffAlgorithm, Hunk, edit_script};
pub use line::LineComparable;
pub use redline::{Block, Line, LineStatus, RedlinedDocument};
pub use types::{AccountingType, DiffFragment, DiffResult, LocCounts, RedlineLine, RedlineStatus};

use thiserror::Error;

/// Invariant violations raised while composing versions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("Hunk {hunk} is out of order: expected positions at or after -{old} +{new}")]
    InvalidDiffOrder { hunk: Hunk, old: usize, new: usize },

    #[error("Hunk {hunk} is out of range: old length {old_len}, new length {new_len}")]
    HunkOutOfRange {
        hunk: Hunk,
        old_len: usize,
        new_len: usize,
    },

    #[error("Surviving line count {surviving} does not match final version length {expected}")]
    SurvivorMismatch { surviving: usize, expected: usize },
}
