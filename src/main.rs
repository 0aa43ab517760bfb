// src/main.rs
mod catalog;
mod disclosure;
mod mapping;
mod narrative;
mod storage;
mod utils;
mod xbrl;

use clap::{Parser, Subcommand};
use mapping::TagMapping;
use narrative::render::OutputFormat;
use scraper::Html;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the earnings-report extraction tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the tagged-fact time series into one CSV per securities code
    Timeseries {
        /// Securities code (5 alphanumerics) or "all"
        target: String,

        /// Limit the number of codes processed in "all" mode
        #[arg(long)]
        limit: Option<usize>,

        /// Directory holding one subdirectory of .htm documents per code
        #[arg(long, default_value = "downloads/html_summary")]
        input_dir: PathBuf,

        /// Output directory for the per-code CSV files
        #[arg(long, default_value = "output/html_summary")]
        output_dir: PathBuf,

        /// Tag → Japanese-name mapping CSV (processing continues without it)
        #[arg(long, default_value = "xbrl_financial_indicators.csv")]
        indicators: PathBuf,
    },

    /// Extract the sectioned narrative view of each document
    Narrative {
        /// Securities code (5 alphanumerics) or "all"
        target: String,

        /// Output formats, comma-separated (markdown/md, txt, json)
        #[arg(short, long, value_delimiter = ',', default_value = "markdown")]
        formats: Vec<OutputFormat>,

        /// Limit the number of codes processed in "all" mode
        #[arg(long)]
        limit: Option<usize>,

        /// Directory holding one subdirectory of .htm documents per code
        #[arg(long, default_value = "downloads/attachments")]
        input_dir: PathBuf,

        /// Output directory for the narrative files
        #[arg(long, default_value = "output/attachments")]
        output_dir: PathBuf,
    },

    /// Aggregate facts across a document corpus into a tag catalog CSV
    Catalog {
        /// Flat directory of .htm documents
        #[arg(long, default_value = "downloads/matome")]
        input_dir: PathBuf,

        /// Tag metadata mapping CSV consulted at first registration
        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Catalog CSV output path
        #[arg(long, default_value = "xbrl_financial_indicators.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    match args.command {
        Command::Timeseries {
            target,
            limit,
            input_dir,
            output_dir,
            indicators,
        } => run_timeseries(&target, limit, &input_dir, &output_dir, &indicators),
        Command::Narrative {
            target,
            formats,
            limit,
            input_dir,
            output_dir,
        } => run_narrative(&target, &formats, limit, &input_dir, &output_dir),
        Command::Catalog {
            input_dir,
            mapping,
            output,
        } => run_catalog(&input_dir, mapping.as_deref(), &output),
    }
}

/// Resolves "all" or a single code into the list of code directories to
/// process.
fn resolve_codes(target: &str, input_dir: &Path, limit: Option<usize>) -> Result<Vec<String>, AppError> {
    if target.eq_ignore_ascii_case("all") {
        let mut codes = disclosure::list_code_dirs(input_dir)?;
        if let Some(limit) = limit {
            codes.truncate(limit);
        }
        if codes.is_empty() {
            return Err(AppError::Config(format!(
                "No securities-code directories found under {}",
                input_dir.display()
            )));
        }
        Ok(codes)
    } else {
        if !disclosure::is_valid_code(target) {
            return Err(AppError::Config(format!(
                "Securities code must be 5 alphanumeric characters: {target}"
            )));
        }
        if !input_dir.join(target).is_dir() {
            return Err(AppError::Config(format!(
                "No directory for securities code {target} under {}",
                input_dir.display()
            )));
        }
        Ok(vec![target.to_string()])
    }
}

fn run_timeseries(
    target: &str,
    limit: Option<usize>,
    input_dir: &Path,
    output_dir: &Path,
    indicators: &Path,
) -> Result<(), AppError> {
    // The mapping only fills the factor_jp column; a missing file is not an
    // error, names just stay empty.
    let mapping = match TagMapping::load(indicators) {
        Ok(mapping) => mapping,
        Err(e) => {
            tracing::warn!("Indicator mapping unavailable ({}), continuing without names", e);
            TagMapping::default()
        }
    };

    let storage = StorageManager::new(output_dir)?;
    let codes = resolve_codes(target, input_dir, limit)?;
    tracing::info!("Processing time series for {} code(s)", codes.len());

    let mut success_count = 0;
    let mut failure_count = 0;

    for code in &codes {
        match extract_timeseries_code(code, &input_dir.join(code), &mapping, &storage) {
            Ok(record_count) => {
                success_count += 1;
                tracing::info!("Finished {} ({} records)", code, record_count);
            }
            Err(e) => {
                failure_count += 1;
                tracing::error!("Failed to process {}: {}", code, e);
            }
        }
    }

    tracing::info!("Processing finished. Success: {}, Failures: {}", success_count, failure_count);

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract a time series from all {failure_count} code(s)"
        )));
    }
    Ok(())
}

/// Extracts and saves the fact time series of one securities code.
fn extract_timeseries_code(
    code: &str,
    code_dir: &Path,
    mapping: &TagMapping,
    storage: &StorageManager,
) -> Result<usize, AppError> {
    let documents = disclosure::list_documents(code_dir)?;
    let mut records = Vec::new();
    let mut error_files: Vec<(String, String)> = Vec::new();
    let mut processed = 0;

    for doc in &documents {
        if !doc.has_date() {
            tracing::warn!("Skipping document without date prefix: {}", doc.file_name);
            continue;
        }
        let content = match fs::read_to_string(&doc.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", doc.file_name, e);
                error_files.push((doc.file_name.clone(), e.to_string()));
                continue;
            }
        };

        let document = Html::parse_document(&content);
        let resolved = xbrl::resolve_document(&xbrl::extract_facts(&document));
        records.extend(xbrl::build_records(&doc.date, &resolved, mapping));
        processed += 1;
    }

    if records.is_empty() {
        tracing::warn!("No records extracted for {}", code);
    } else {
        storage.save_timeseries(code, &records)?;
    }

    let unique_tags: HashSet<&str> = records.iter().map(|r| r.factor_tag.as_str()).collect();
    let mut dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
    dates.sort_unstable();
    dates.dedup();
    tracing::info!(
        "{}: {} documents, {} records, {} unique tags, period {} - {}, {} read errors",
        code,
        processed,
        records.len(),
        unique_tags.len(),
        dates.first().unwrap_or(&"-"),
        dates.last().unwrap_or(&"-"),
        error_files.len()
    );

    Ok(records.len())
}

fn run_narrative(
    target: &str,
    formats: &[OutputFormat],
    limit: Option<usize>,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<(), AppError> {
    // Dedupe while keeping the order the user asked for.
    let mut seen = Vec::new();
    for format in formats {
        if !seen.contains(format) {
            seen.push(*format);
        }
    }
    let formats = seen;

    let storage = StorageManager::new(output_dir)?;
    let codes = resolve_codes(target, input_dir, limit)?;
    tracing::info!("Processing narratives for {} code(s)", codes.len());

    let mut success_count = 0;
    let mut failure_count = 0;

    for code in &codes {
        match extract_narrative_code(code, &input_dir.join(code), &formats, &storage) {
            Ok(document_count) => {
                success_count += 1;
                tracing::info!("Finished {} ({} documents)", code, document_count);
            }
            Err(e) => {
                failure_count += 1;
                tracing::error!("Failed to process {}: {}", code, e);
            }
        }
    }

    tracing::info!("Processing finished. Success: {}, Failures: {}", success_count, failure_count);

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract narratives from all {failure_count} code(s)"
        )));
    }
    Ok(())
}

/// Renders every document of one securities code in each requested format.
fn extract_narrative_code(
    code: &str,
    code_dir: &Path,
    formats: &[OutputFormat],
    storage: &StorageManager,
) -> Result<usize, AppError> {
    let documents = disclosure::list_documents(code_dir)?;
    let mut saved = 0;
    let mut error_files: Vec<(String, String)> = Vec::new();

    for doc in &documents {
        let content = match fs::read_to_string(&doc.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", doc.file_name, e);
                error_files.push((doc.file_name.clone(), e.to_string()));
                continue;
            }
        };

        let document = Html::parse_document(&content);
        let sections = narrative::synthesize_sections(&document);
        tracing::debug!("{}: {} sections", doc.file_name, sections.len());

        let title = format!("{} - 決算短信添付資料", doc.stem());
        for format in formats {
            let rendered = format.render(&sections, &title);
            storage.save_narrative(code, doc.stem(), *format, &rendered)?;
        }
        saved += 1;
    }

    if !error_files.is_empty() {
        tracing::warn!("{}: {} document(s) could not be read", code, error_files.len());
    }
    Ok(saved)
}

fn run_catalog(input_dir: &Path, mapping_path: Option<&Path>, output: &Path) -> Result<(), AppError> {
    let mapping = match mapping_path {
        Some(path) => match TagMapping::load(path) {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::warn!("Tag mapping unavailable ({}), continuing with inference only", e);
                TagMapping::default()
            }
        },
        None => TagMapping::default(),
    };

    let documents = disclosure::list_documents(input_dir)?;
    if documents.is_empty() {
        return Err(AppError::Config(format!(
            "No .htm documents found under {}",
            input_dir.display()
        )));
    }
    tracing::info!("Analyzing {} documents", documents.len());

    let mut tag_catalog = catalog::TagCatalog::new(mapping);

    for doc in &documents {
        let content = match fs::read_to_string(&doc.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", doc.file_name, e);
                tag_catalog.record_failure(&doc.file_name, &e.to_string());
                continue;
            }
        };

        let standard = catalog::detect_accounting_standard(&doc.file_name);
        let document = Html::parse_document(&content);
        let facts = xbrl::extract_facts(&document);
        tag_catalog.ingest_document(&doc.file_name, standard, &facts);
    }

    tracing::info!(
        "Analysis complete: {} documents processed, {} unique tags, {} errors",
        tag_catalog.processed_documents(),
        tag_catalog.unique_tags(),
        tag_catalog.errors().len()
    );
    for failure in tag_catalog.errors() {
        tracing::warn!("  {}: {}", failure.document, failure.message);
    }

    let rows = tag_catalog.finalize();
    storage::export_catalog(output, &rows)?;

    Ok(())
}
