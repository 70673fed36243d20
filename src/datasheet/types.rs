use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a repeated name inside one lookup is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    FirstWins,
    LastWins,
}

/// Repeated parameter names inside a category block keep their first row
pub const PARAMETER_DUPLICATE_POLICY: DuplicatePolicy = DuplicatePolicy::FirstWins;

/// Repeated streamtable tag names keep their last row
pub const TAG_DUPLICATE_POLICY: DuplicatePolicy = DuplicatePolicy::LastWins;

/// A name that appeared on more than one row of the same lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub name: String,
    pub kept_row: u32,
    pub dropped_row: u32,
}

impl DuplicatePolicy {
    /// Record `name` at `row`, resolving a clash with an earlier row by this policy.
    /// Returns the clash when there was one.
    pub fn insert(
        self,
        rows: &mut HashMap<String, u32>,
        name: &str,
        row: u32,
    ) -> Option<DuplicateEntry> {
        let Some(&previous) = rows.get(name) else {
            rows.insert(name.to_string(), row);
            return None;
        };

        match self {
            DuplicatePolicy::FirstWins => Some(DuplicateEntry {
                name: name.to_string(),
                kept_row: previous,
                dropped_row: row,
            }),
            DuplicatePolicy::LastWins => {
                rows.insert(name.to_string(), row);
                Some(DuplicateEntry {
                    name: name.to_string(),
                    kept_row: row,
                    dropped_row: previous,
                })
            }
        }
    }
}

/// A master unit cell replaced by the streamtable's unit declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitChange {
    pub parameter: String,
    pub tag: String,
    pub row: u32,
    pub previous: Option<String>,
    pub unit: String,
}

/// Why a common equipment sheet was left untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The mapping has no pairs for this equipment type
    Unmapped,
    /// The master sheet has no target category block
    BlockAbsent,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Unmapped => "no mapping entries",
            SkipReason::BlockAbsent => "parameter block not found in master sheet",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetSkip {
    pub equipment: String,
    pub reason: SkipReason,
}

/// What reconciling one equipment sheet did
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SheetOutcome {
    pub equipment: String,
    pub values_written: u32,
    pub unit_changes: Vec<UnitChange>,
    /// Mapped pairs dropped because the parameter or tag is missing from this sheet
    pub unmatched_pairs: u32,
    pub master_only_columns: Vec<String>,
    pub appended_unit_tags: Vec<String>,
    /// Unit tags left out of the master header because a header cell was already taken
    pub blocked_unit_tags: Vec<String>,
    pub duplicate_parameters: Vec<DuplicateEntry>,
    pub duplicate_tags: Vec<DuplicateEntry>,
}

/// Result of one reconciliation pass over a workbook pair
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PopulateReport {
    /// Master equipment sheets with no streamtable counterpart, sorted
    pub missing: Vec<String>,
    pub sheets: Vec<SheetOutcome>,
    pub skipped: Vec<SheetSkip>,
}

impl PopulateReport {
    pub fn values_written(&self) -> u32 {
        self.sheets.iter().map(|s| s.values_written).sum()
    }

    pub fn unit_changes(&self) -> impl Iterator<Item = (&str, &UnitChange)> {
        self.sheets
            .iter()
            .flat_map(|s| s.unit_changes.iter().map(move |c| (s.equipment.as_str(), c)))
    }

    pub fn sheet(&self, equipment: &str) -> Option<&SheetOutcome> {
        self.sheets.iter().find(|s| s.equipment == equipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_wins_keeps_original_row() {
        let mut rows = HashMap::new();
        assert_eq!(DuplicatePolicy::FirstWins.insert(&mut rows, "Flow", 5), None);
        let dup = DuplicatePolicy::FirstWins.insert(&mut rows, "Flow", 9).unwrap();
        assert_eq!(rows["Flow"], 5);
        assert_eq!((dup.kept_row, dup.dropped_row), (5, 9));
    }

    #[test]
    fn test_last_wins_replaces_row() {
        let mut rows = HashMap::new();
        DuplicatePolicy::LastWins.insert(&mut rows, "FT-101", 4);
        let dup = DuplicatePolicy::LastWins.insert(&mut rows, "FT-101", 8).unwrap();
        assert_eq!(rows["FT-101"], 8);
        assert_eq!((dup.kept_row, dup.dropped_row), (8, 4));
    }

    #[test]
    fn test_policies_are_asymmetric() {
        assert_eq!(PARAMETER_DUPLICATE_POLICY, DuplicatePolicy::FirstWins);
        assert_eq!(TAG_DUPLICATE_POLICY, DuplicatePolicy::LastWins);
    }
}
