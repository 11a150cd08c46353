use super::types::{AccountingType, DiffFragment, LocCounts};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How to classify a file whose only differences are uncounted (comments,
/// blank lines)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentOnlyPolicy {
    /// Surface the textual change to reviewers
    #[default]
    Modified,
    /// Treat the file as unchanged for size tracking
    Base,
}

/// Assigns one overall change type to a file
#[derive(Debug, Clone, Copy, Default)]
pub struct FileChangeClassifier {
    policy: CommentOnlyPolicy,
}

impl FileChangeClassifier {
    pub fn new(policy: CommentOnlyPolicy) -> Self {
        Self { policy }
    }

    /// Determine the change type of a file.
    ///
    /// `macro_type` is Added when the history began with the file missing,
    /// Deleted when it ended with the file missing, Base otherwise.
    pub fn classify(
        &self,
        macro_type: AccountingType,
        counts: &LocCounts,
        fragments: &[DiffFragment],
    ) -> AccountingType {
        use AccountingType::*;

        match macro_type {
            Added if counts.is_zero(&[Base]) => return Added,
            Added => {
                warn!(
                    "File was created but reports {} base lines; classifying as Modified",
                    counts.base
                );
                return Modified;
            }
            Deleted if counts.is_zero(&[Total]) => return Deleted,
            Deleted => {
                warn!(
                    "File was deleted but reports {} total lines; classifying as Modified",
                    counts.total
                );
                return Modified;
            }
            _ => {}
        }

        if counts.is_zero(&[Deleted, Modified, Added]) {
            let uncounted_changes = fragments.iter().any(|f| f.kind != Base);
            if !uncounted_changes || self.policy == CommentOnlyPolicy::Base {
                return Base;
            }
        }

        Modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(kind: AccountingType) -> DiffFragment {
        DiffFragment {
            kind,
            start_line: 1,
            old_text: vec!["a // x".to_string()],
            new_text: vec!["a // y".to_string()],
        }
    }

    #[test]
    fn created_file_is_added() {
        let counts = LocCounts {
            added: 10,
            total: 10,
            ..LocCounts::default()
        };
        let classifier = FileChangeClassifier::default();
        assert_eq!(
            classifier.classify(AccountingType::Added, &counts, &[]),
            AccountingType::Added
        );
    }

    #[test]
    fn contradictory_macro_type_downgrades_to_modified() {
        let counts = LocCounts {
            base: 1,
            total: 1,
            ..LocCounts::default()
        };
        let classifier = FileChangeClassifier::default();
        assert_eq!(
            classifier.classify(AccountingType::Added, &counts, &[]),
            AccountingType::Modified
        );
        assert_eq!(
            classifier.classify(AccountingType::Deleted, &counts, &[]),
            AccountingType::Modified
        );
    }

    #[test]
    fn deleted_file_is_deleted() {
        let counts = LocCounts {
            base: 4,
            deleted: 4,
            ..LocCounts::default()
        };
        assert_eq!(
            FileChangeClassifier::default().classify(AccountingType::Deleted, &counts, &[]),
            AccountingType::Deleted
        );
    }

    #[test]
    fn unchanged_file_is_base() {
        let counts = LocCounts {
            base: 3,
            total: 3,
            ..LocCounts::default()
        };
        assert_eq!(
            FileChangeClassifier::default().classify(AccountingType::Base, &counts, &[]),
            AccountingType::Base
        );
    }

    #[test]
    fn uncounted_changes_follow_policy() {
        let counts = LocCounts {
            base: 3,
            total: 3,
            ..LocCounts::default()
        };
        let fragments = [fragment(AccountingType::Modified)];
        assert_eq!(
            FileChangeClassifier::new(CommentOnlyPolicy::Modified).classify(
                AccountingType::Base,
                &counts,
                &fragments
            ),
            AccountingType::Modified
        );
        assert_eq!(
            FileChangeClassifier::new(CommentOnlyPolicy::Base).classify(
                AccountingType::Base,
                &counts,
                &fragments
            ),
            AccountingType::Base
        );
    }

    #[test]
    fn counted_changes_are_modified() {
        let counts = LocCounts {
            base: 3,
            added: 1,
            total: 4,
            ..LocCounts::default()
        };
        assert_eq!(
            FileChangeClassifier::default().classify(AccountingType::Base, &counts, &[]),
            AccountingType::Modified
        );
    }
}
