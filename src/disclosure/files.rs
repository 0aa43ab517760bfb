// src/disclosure/files.rs

// --- Imports ---
use crate::disclosure::models::DocumentInfo;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::Path;

/// Documents without a date prefix sort after every dated one.
pub const UNDATED_SORT_KEY: &str = "9999-99-99";

// Securities codes are 5 alphanumeric characters (e.g. "13010", "130A0").
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z]{5}$").expect("Failed to compile CODE_RE"));

// Disclosure filenames start with the disclosure date.
static DATE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("Failed to compile DATE_PREFIX_RE"));

pub fn is_valid_code(code: &str) -> bool {
    CODE_RE.is_match(code)
}

/// The disclosure date encoded in a filename, or the undated sort key.
pub fn date_from_file_name(file_name: &str) -> String {
    DATE_PREFIX_RE
        .captures(file_name)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| UNDATED_SORT_KEY.to_string())
}

/// Lists the securities-code directories under the download tree, sorted.
pub fn list_code_dirs(base_dir: &Path) -> io::Result<Vec<String>> {
    let mut codes = Vec::new();
    for entry in std::fs::read_dir(base_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if is_valid_code(name) {
                codes.push(name.to_string());
            }
        }
    }
    codes.sort();
    Ok(codes)
}

/// Lists the `.htm` documents of one directory, sorted by disclosure date
/// then filename so the time series comes out in order.
pub fn list_documents(dir: &Path) -> io::Result<Vec<DocumentInfo>> {
    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() || path.extension().and_then(|e| e.to_str()) != Some("htm")
        {
            continue;
        }
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        documents.push(DocumentInfo {
            date: date_from_file_name(&file_name),
            file_name,
            path,
        });
    }
    documents.sort_by(|a, b| (&a.date, &a.file_name).cmp(&(&b.date, &b.file_name)));

    tracing::debug!("Found {} documents under {}", documents.len(), dir.display());
    Ok(documents)
}
