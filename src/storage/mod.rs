// src/storage/mod.rs
use crate::catalog::CatalogRow;
use crate::narrative::render::OutputFormat;
use crate::utils::error::StorageError;
use crate::xbrl::models::NormalizedRecord;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Saves the time-series records of one securities code as
    /// `<base>/<code>.csv`.
    pub fn save_timeseries(
        &self,
        code: &str,
        records: &[NormalizedRecord],
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{code}.csv"));
        write_csv_with_bom(&file_path, records)?;

        tracing::info!("Saved {} records to {}", records.len(), file_path.display());
        Ok(file_path)
    }

    /// Saves one rendered narrative document as `<base>/<code>/<stem>.<ext>`.
    pub fn save_narrative(
        &self,
        code: &str,
        stem: &str,
        format: OutputFormat,
        content: &str,
    ) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(code);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join(format!("{stem}.{}", format.extension()));
        fs::write(&file_path, content).map_err(StorageError::IoError)?;

        tracing::info!("Saved narrative to {}", file_path.display());
        Ok(file_path)
    }
}

/// Writes the finalized tag catalog to an explicit path (the catalog is a
/// single corpus-wide file, not part of a per-code output tree).
pub fn export_catalog<P: AsRef<Path>>(path: P, rows: &[CatalogRow]) -> Result<(), StorageError> {
    write_csv_with_bom(path.as_ref(), rows)?;
    tracing::info!("Saved {} catalog entries to {}", rows.len(), path.as_ref().display());
    Ok(())
}

// The downstream spreadsheet tooling expects UTF-8 with a BOM.
fn write_csv_with_bom<S: Serialize>(path: &Path, rows: &[S]) -> Result<(), StorageError> {
    let mut file = fs::File::create(path).map_err(StorageError::IoError)?;
    file.write_all("\u{feff}".as_bytes())
        .map_err(StorageError::IoError)?;

    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(StorageError::IoError)?;
    Ok(())
}
