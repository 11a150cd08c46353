use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// LOC accounting categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountingType {
    Base,
    Deleted,
    Modified,
    Added,
    Total,
}

impl AccountingType {
    pub const ALL: [AccountingType; 5] = [
        AccountingType::Base,
        AccountingType::Deleted,
        AccountingType::Modified,
        AccountingType::Added,
        AccountingType::Total,
    ];
}

impl fmt::Display for AccountingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountingType::Base => "Base",
            AccountingType::Deleted => "Deleted",
            AccountingType::Modified => "Modified",
            AccountingType::Added => "Added",
            AccountingType::Total => "Total",
        };
        f.write_str(name)
    }
}

/// Line counts for one file, one per accounting category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocCounts {
    pub base: usize,
    pub deleted: usize,
    pub modified: usize,
    pub added: usize,
    pub total: usize,
}

impl LocCounts {
    pub fn get(&self, kind: AccountingType) -> usize {
        match kind {
            AccountingType::Base => self.base,
            AccountingType::Deleted => self.deleted,
            AccountingType::Modified => self.modified,
            AccountingType::Added => self.added,
            AccountingType::Total => self.total,
        }
    }

    pub fn add(&mut self, kind: AccountingType, count: usize) {
        match kind {
            AccountingType::Base => self.base += count,
            AccountingType::Deleted => self.deleted += count,
            AccountingType::Modified => self.modified += count,
            AccountingType::Added => self.added += count,
            AccountingType::Total => self.total += count,
        }
    }

    /// True when every listed category is zero
    pub fn is_zero(&self, kinds: &[AccountingType]) -> bool {
        kinds.iter().all(|kind| self.get(*kind) == 0)
    }

    /// Whether the size identity `Total = Base - Deleted + Added` holds
    pub fn is_balanced(&self) -> bool {
        self.base + self.added == self.total + self.deleted
    }
}

impl AddAssign for LocCounts {
    fn add_assign(&mut self, rhs: Self) {
        for kind in AccountingType::ALL {
            self.add(kind, rhs.get(kind));
        }
    }
}

/// One contiguous changed region of the final redline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFragment {
    /// Deleted, Added, or Modified for a paired replacement
    pub kind: AccountingType,
    /// 1-based line in the final version where the region sits
    pub start_line: usize,
    pub old_text: Vec<String>,
    pub new_text: Vec<String>,
}

/// Status of one line of the rendered redline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedlineStatus {
    Unchanged,
    Added,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedlineLine {
    pub status: RedlineStatus,
    pub content: String,
}

/// Everything computed for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub filename: String,
    pub filter_name: String,
    pub change_type: AccountingType,
    pub counts: LocCounts,
    pub fragments: Vec<DiffFragment>,
    pub redlines: Vec<RedlineLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_category() {
        let mut counts = LocCounts::default();
        counts.add(AccountingType::Base, 3);
        counts.add(AccountingType::Total, 4);
        counts.add(AccountingType::Added, 1);
        assert_eq!(counts.get(AccountingType::Base), 3);
        assert!(counts.is_zero(&[AccountingType::Deleted, AccountingType::Modified]));
        assert!(counts.is_balanced());

        let mut sum = LocCounts::default();
        sum += counts;
        sum += counts;
        assert_eq!(sum.total, 8);
    }
}
