// src/mapping.rs

// --- Imports ---
use crate::utils::error::StorageError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Externally supplied metadata for one tag. Missing CSV columns default to
/// empty, so the same loader serves both the full JPEN list and the thinner
/// indicators file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagMetadata {
    #[serde(default)]
    pub xbrl_tag: String,
    #[serde(default)]
    pub japanese_name: String,
    #[serde(default)]
    pub english_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// Tag name → metadata table, consulted at catalog registration and for
/// the `factor_jp` column of the time series.
#[derive(Debug, Default)]
pub struct TagMapping {
    entries: HashMap<String, TagMetadata>,
}

impl TagMapping {
    /// Loads the mapping CSV. The files in the wild are UTF-8 with a BOM,
    /// so a leading BOM is stripped before parsing.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let content = fs::read_to_string(path.as_ref()).map_err(StorageError::IoError)?;
        let content = content.trim_start_matches('\u{feff}');

        let mut entries = HashMap::new();
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        for row in reader.deserialize::<TagMetadata>() {
            let mut meta = row?;
            meta.xbrl_tag = meta.xbrl_tag.trim().to_string();
            meta.japanese_name = meta.japanese_name.trim().to_string();
            meta.english_name = meta.english_name.trim().to_string();
            meta.category = meta.category.trim().to_string();
            meta.description = meta.description.trim().to_string();
            if !meta.xbrl_tag.is_empty() {
                entries.insert(meta.xbrl_tag.clone(), meta);
            }
        }

        tracing::info!("Loaded {} tag mappings", entries.len());
        Ok(Self { entries })
    }

    pub fn get(&self, tag_name: &str) -> Option<&TagMetadata> {
        self.entries.get(tag_name)
    }

    /// The mapped Japanese name, or empty for unmapped tags.
    pub fn japanese_name(&self, tag_name: &str) -> &str {
        self.get(tag_name).map(|m| m.japanese_name.as_str()).unwrap_or("")
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_bom_prefixed_csv_and_trims_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "\u{feff}xbrl_tag,japanese_name,english_name,category,description\n\
             tse-ed-t:NetSales, 売上高 ,Net sales,P&L,\n\
             ,missing tag ignored,,,\n"
        )
        .unwrap();

        let mapping = TagMapping::load(file.path()).unwrap();
        assert_eq!(mapping.japanese_name("tse-ed-t:NetSales"), "売上高");
        assert_eq!(mapping.get("tse-ed-t:NetSales").unwrap().category, "P&L");
        assert!(mapping.get("").is_none(), "rows without a tag are skipped");
    }

    #[test]
    fn tolerates_missing_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "xbrl_tag,japanese_name\ntse-ed-t:NetSales,売上高\n").unwrap();

        let mapping = TagMapping::load(file.path()).unwrap();
        let meta = mapping.get("tse-ed-t:NetSales").unwrap();
        assert_eq!(meta.japanese_name, "売上高");
        assert_eq!(meta.category, "");
        assert_eq!(meta.description, "");
    }

    #[test]
    fn unmapped_tags_resolve_to_empty_name() {
        let mapping = TagMapping::default();
        assert_eq!(mapping.japanese_name("t:Unknown"), "");
    }
}
