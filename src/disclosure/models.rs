// src/disclosure/models.rs
use std::path::PathBuf;

/// One downloaded disclosure document on disk.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Disclosure date from the filename prefix, or the undated sort key.
    pub date: String,
    pub file_name: String,
    pub path: PathBuf,
}

impl DocumentInfo {
    /// Filename without the `.htm` extension, used for output naming.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(".htm")
            .unwrap_or(&self.file_name)
    }

    pub fn has_date(&self) -> bool {
        self.date != super::files::UNDATED_SORT_KEY
    }
}
