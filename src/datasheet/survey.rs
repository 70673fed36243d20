//! What can be mapped: for each equipment sheet present in both workbooks, the
//! target block's parameters and the streamtable tags they may be paired with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::block::extract_block;
use super::mapping::Mapping;
use super::populate::{common_equipment, missing_equipment};
use super::tags::build_tag_index;
use super::types::DuplicateEntry;
use crate::config::LayoutConfig;
use crate::excel::Workbook;

/// A mapping file skeleton: every parameter listed, `null` meaning "skip"
pub type MappingTemplate = BTreeMap<String, BTreeMap<String, Option<String>>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetSurvey {
    pub equipment: String,
    /// Parameters of the target block, in sheet order
    pub parameters: Vec<String>,
    /// Streamtable tag names, sorted
    pub tags: Vec<String>,
    pub duplicate_parameters: Vec<DuplicateEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurveySkipReason {
    ParametersNotFound,
    TagsNotAvailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveySkip {
    pub equipment: String,
    pub reason: SurveySkipReason,
}

impl SurveySkip {
    pub fn message(&self, category: &str) -> String {
        match self.reason {
            SurveySkipReason::ParametersNotFound => format!(
                "{} parameters not found in {} master datasheet. Skipping.",
                category, self.equipment
            ),
            SurveySkipReason::TagsNotAvailable => format!(
                "Tags not available for {} in the streamtable. Skipping.",
                self.equipment
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MappingSurvey {
    pub missing: Vec<String>,
    pub sheets: Vec<SheetSurvey>,
    pub skipped: Vec<SurveySkip>,
}

pub fn survey(master: &Workbook, stream: &Workbook, layout: &LayoutConfig) -> MappingSurvey {
    let mut result = MappingSurvey {
        missing: missing_equipment(master, stream),
        ..MappingSurvey::default()
    };

    let mut common = common_equipment(master, stream);
    common.sort();

    for equipment in common {
        let (Some(master_sheet), Some(stream_sheet)) = (master.sheet(&equipment), stream.sheet(&equipment))
        else {
            continue;
        };

        let block = extract_block(master_sheet, &layout.master, layout.target_block());
        if block.is_empty() {
            result.skipped.push(SurveySkip {
                equipment,
                reason: SurveySkipReason::ParametersNotFound,
            });
            continue;
        }

        let tags = build_tag_index(stream_sheet, &layout.stream, layout.first_value_col);
        if tags.is_empty() {
            result.skipped.push(SurveySkip {
                equipment,
                reason: SurveySkipReason::TagsNotAvailable,
            });
            continue;
        }

        result.sheets.push(SheetSurvey {
            equipment,
            parameters: block.names,
            tags: tags.sorted_tags(),
            duplicate_parameters: block.duplicates,
        });
    }

    result
}

impl MappingSurvey {
    /// Mapping skeleton covering every surveyed parameter.
    ///
    /// Choices already made in `existing` are kept when their tag is still offered.
    pub fn template(&self, existing: Option<&Mapping>) -> MappingTemplate {
        let mut template = MappingTemplate::new();
        for sheet in &self.sheets {
            let chosen = existing.and_then(|m| m.for_equipment(&sheet.equipment));
            let entries = template.entry(sheet.equipment.clone()).or_default();
            for parameter in &sheet.parameters {
                let tag = chosen
                    .and_then(|pairs| pairs.get(parameter))
                    .filter(|tag| sheet.tags.contains(tag))
                    .cloned();
                entries.insert(parameter.clone(), tag);
            }
        }
        template
    }
}
