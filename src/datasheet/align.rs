use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit tag present in both documents, with its column in each
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnPair {
    pub unit_tag: String,
    pub master_col: u32,
    pub stream_col: u32,
}

/// Master and streamtable unit-tag columns matched by tag name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnAlignment {
    /// In master column order
    pub pairs: Vec<ColumnPair>,
    pub master_only: Vec<String>,
    pub stream_only: Vec<String>,
}

/// Match two independently ordered unit-tag headers by exact name.
///
/// Both headers start at `first_col`. A name repeated in the streamtable
/// header resolves to its leftmost column.
pub fn align_columns(master_tags: &[String], stream_tags: &[String], first_col: u32) -> ColumnAlignment {
    let mut stream_cols: HashMap<&str, u32> = HashMap::new();
    for (offset, tag) in stream_tags.iter().enumerate() {
        stream_cols.entry(tag.as_str()).or_insert(first_col + offset as u32);
    }

    let mut alignment = ColumnAlignment::default();
    for (offset, tag) in master_tags.iter().enumerate() {
        match stream_cols.get(tag.as_str()) {
            Some(&stream_col) => alignment.pairs.push(ColumnPair {
                unit_tag: tag.clone(),
                master_col: first_col + offset as u32,
                stream_col,
            }),
            None => alignment.master_only.push(tag.clone()),
        }
    }

    alignment.stream_only = stream_tags
        .iter()
        .filter(|tag| !master_tags.contains(tag))
        .cloned()
        .collect();

    alignment
}
