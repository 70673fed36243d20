use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::excel::ExcelError;

/// Master parameter name → streamtable tag name, for one equipment type
pub type SheetMapping = BTreeMap<String, String>;

/// Shape of a mapping file: a `null` or blank tag means the parameter is skipped
type RawMapping = BTreeMap<String, BTreeMap<String, Option<String>>>;

/// Equipment type → (master parameter → streamtable tag).
///
/// Built by whoever picks the pairs (a hand-edited JSON file, a UI). Names are
/// matched exactly against the trimmed parameter and tag names of each sheet;
/// pairs naming something a sheet lacks are ignored when reconciling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMapping")]
pub struct Mapping(BTreeMap<String, SheetMapping>);

impl From<RawMapping> for Mapping {
    fn from(raw: RawMapping) -> Self {
        let mut mapping = Mapping::new();
        for (equipment, pairs) in raw {
            for (parameter, tag) in pairs {
                if let Some(tag) = tag {
                    mapping.insert(&equipment, &parameter, &tag);
                }
            }
        }
        mapping
    }
}

impl Mapping {
    pub fn new() -> Self {
        Mapping(BTreeMap::new())
    }

    /// Add a pair. Names are trimmed; a blank parameter or tag is treated as "skip".
    pub fn insert(&mut self, equipment: &str, parameter: &str, tag: &str) {
        let (parameter, tag) = (parameter.trim(), tag.trim());
        if parameter.is_empty() || tag.is_empty() {
            return;
        }
        self.0
            .entry(equipment.to_string())
            .or_default()
            .insert(parameter.to_string(), tag.to_string());
    }

    /// Pairs for one equipment type; `None` when it has none
    pub fn for_equipment(&self, equipment: &str) -> Option<&SheetMapping> {
        self.0.get(equipment).filter(|pairs| !pairs.is_empty())
    }

    pub fn pair_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// True when no equipment type has a single pair
    pub fn is_empty(&self) -> bool {
        self.pair_count() == 0
    }

    pub fn from_json_str(json: &str) -> Result<Self, ExcelError> {
        serde_json::from_str(json)
            .map_err(|e| ExcelError::mapping_error(format!("Invalid mapping: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExcelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ExcelError::file_not_found(&path.display().to_string()));
        }
        let json = std::fs::read_to_string(path).map_err(|e| {
            ExcelError::mapping_error(format!("Failed to read mapping {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ExcelError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ExcelError::mapping_error(format!("Failed to serialize mapping: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_entries_are_dropped() {
        let mapping = Mapping::from_json_str(
            r#"{
                "Pump-101": { "Flow Rate": "FT-101", "Head": null, "Speed": "  " },
                "Tank-7": { "Level": null }
            }"#,
        )
        .unwrap();

        let pump = mapping.for_equipment("Pump-101").unwrap();
        assert_eq!(pump.len(), 1);
        assert_eq!(pump["Flow Rate"], "FT-101");
        assert!(mapping.for_equipment("Tank-7").is_none());
        assert_eq!(mapping.pair_count(), 1);
        assert!(!mapping.is_empty());
    }

    #[test]
    fn test_all_skipped_is_empty() {
        let mapping = Mapping::from_json_str(r#"{ "Pump-101": { "Flow Rate": null } }"#).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_names_are_trimmed() {
        let mut mapping = Mapping::new();
        mapping.insert("Pump-101", " Flow Rate ", "FT-101\t");
        assert_eq!(mapping.for_equipment("Pump-101").unwrap()["Flow Rate"], "FT-101");
    }

    #[test]
    fn test_json_round_trip_keeps_pairs() {
        let mut mapping = Mapping::new();
        mapping.insert("Pump-101", "Flow Rate", "FT-101");
        let json = mapping.to_json_pretty().unwrap();
        assert_eq!(Mapping::from_json_str(&json).unwrap(), mapping);
    }

    #[test]
    fn test_malformed_json_is_mapping_error() {
        let err = Mapping::from_json_str(r#"["Pump-101"]"#).unwrap_err();
        assert_eq!(err.error_type, crate::excel::ExcelErrorType::MappingError);
    }
}
