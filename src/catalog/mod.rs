// src/catalog/mod.rs

// --- Imports ---
use crate::mapping::TagMapping;
use crate::xbrl::models::Fact;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

// --- Constants ---
// Sample values collected per tag, and the subset exported to CSV.
const SAMPLE_CAP: usize = 5;
const SAMPLE_EXPORT: usize = 3;

pub const STANDARD_IFRS: &str = "IFRS";
pub const STANDARD_DOMESTIC: &str = "日本基準";

/// Accounting standard for one document, inferred from its filename.
/// Disclosure filenames carry the standard in half- or full-width form;
/// everything else is the domestic default.
pub fn detect_accounting_standard(filename: &str) -> &'static str {
    if filename.to_uppercase().contains("IFRS") || filename.contains("ＩＦＲＳ") {
        STANDARD_IFRS
    } else {
        STANDARD_DOMESTIC
    }
}

// --- Category inference ---
struct CategoryRule {
    label: &'static str,
    keywords: &'static [&'static str],
    // Additional substring the name must also contain, e.g. "cash" for C/F.
    requires: Option<&'static str>,
}

// Ordered buckets, first match wins.
static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        label: "basic info",
        keywords: &[
            "company",
            "securities",
            "filing",
            "document",
            "representative",
            "inquiries",
            "tel",
            "url",
            "stockexchange",
        ],
        requires: None,
    },
    CategoryRule {
        label: "P&L",
        keywords: &[
            "sales",
            "revenue",
            "income",
            "profit",
            "loss",
            "expense",
            "cost",
            "operating",
            "ordinary",
            "netincome",
        ],
        requires: None,
    },
    CategoryRule {
        label: "B/S",
        keywords: &[
            "assets",
            "liabilities",
            "equity",
            "capital",
            "debt",
            "cash",
            "inventory",
            "property",
        ],
        requires: None,
    },
    CategoryRule {
        label: "C/F",
        keywords: &["cashflow", "financing", "investing", "operating"],
        requires: Some("cash"),
    },
    CategoryRule {
        label: "indicator",
        keywords: &["ratio", "rate", "change", "pershare", "dividend"],
        requires: None,
    },
];

/// Keyword-driven category for tags absent from the external mapping.
pub fn infer_category(tag_name: &str) -> &'static str {
    let name = tag_name.to_lowercase();
    for rule in CATEGORY_RULES {
        let keyword_hit = rule.keywords.iter().any(|k| name.contains(k));
        let requirement_met = rule.requires.map_or(true, |r| name.contains(r));
        if keyword_hit && requirement_met {
            return rule.label;
        }
    }
    "other"
}

// --- Catalog ---

/// A document that could not be analyzed; the batch continues without it.
#[derive(Debug, Clone)]
pub struct DocumentFailure {
    pub document: String,
    pub message: String,
}

/// Accumulating state for one distinct tag name.
#[derive(Debug)]
struct TagEntry {
    xbrl_tag: String,
    japanese_name: String,
    english_name: String,
    category: String,
    description: String,
    standards: Vec<String>,
    sample_values: Vec<String>,
    units: BTreeSet<String>,
    files: HashSet<String>,
    total_occurrences: u64,
}

/// One exported catalog line. Field order is the CSV column order.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow {
    pub xbrl_tag: String,
    pub japanese_name: String,
    pub english_name: String,
    pub category: String,
    pub accounting_standard: String,
    pub sample_value: String,
    pub unit: String,
    pub description: String,
    pub occurrence_detail: String,
}

/// Corpus-wide tag registry. Constructed once per batch, fed one document
/// at a time, then finalized by value into the exportable rows.
#[derive(Debug, Default)]
pub struct TagCatalog {
    mapping: TagMapping,
    entries: Vec<TagEntry>,
    index: HashMap<String, usize>,
    processed_documents: usize,
    errors: Vec<DocumentFailure>,
}

impl TagCatalog {
    pub fn new(mapping: TagMapping) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    /// Folds one document's raw facts into the registry. `standard` is the
    /// document's accounting standard, inferred once by the caller.
    pub fn ingest_document(&mut self, document_id: &str, standard: &str, facts: &[Fact]) {
        self.processed_documents += 1;
        for fact in facts {
            if fact.tag_name.is_empty() {
                continue;
            }
            self.sight(document_id, standard, fact);
        }
    }

    /// Records a document that failed to read or analyze.
    pub fn record_failure(&mut self, document_id: &str, message: &str) {
        self.errors.push(DocumentFailure {
            document: document_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn errors(&self) -> &[DocumentFailure] {
        &self.errors
    }

    pub fn processed_documents(&self) -> usize {
        self.processed_documents
    }

    pub fn unique_tags(&self) -> usize {
        self.entries.len()
    }

    fn sight(&mut self, document_id: &str, standard: &str, fact: &Fact) {
        let slot = match self.index.get(&fact.tag_name) {
            Some(&slot) => slot,
            None => {
                let entry = self.register(&fact.tag_name);
                self.index.insert(fact.tag_name.clone(), self.entries.len());
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[slot];

        if !entry.standards.iter().any(|s| s == standard) {
            entry.standards.push(standard.to_string());
        }
        if !fact.raw_text.is_empty()
            && !fact.is_nil
            && entry.sample_values.len() < SAMPLE_CAP
            && !entry.sample_values.contains(&fact.raw_text)
        {
            entry.sample_values.push(fact.raw_text.clone());
        }
        if let Some(unit) = &fact.unit_ref {
            entry.units.insert(unit.clone());
        }
        entry.total_occurrences += 1;
        entry.files.insert(document_id.to_string());
    }

    /// First registration fixes names, category and description for good.
    /// The external mapping wins over inference; a mapped entry with an
    /// empty category still falls back to the inferred bucket.
    fn register(&self, tag_name: &str) -> TagEntry {
        let (japanese_name, english_name, category, description) = match self.mapping.get(tag_name)
        {
            Some(meta) => {
                let category = if meta.category.is_empty() {
                    infer_category(tag_name).to_string()
                } else {
                    meta.category.clone()
                };
                (
                    meta.japanese_name.clone(),
                    meta.english_name.clone(),
                    category,
                    meta.description.clone(),
                )
            }
            None => (
                String::new(),
                String::new(),
                infer_category(tag_name).to_string(),
                String::new(),
            ),
        };

        TagEntry {
            xbrl_tag: tag_name.to_string(),
            japanese_name,
            english_name,
            category,
            description,
            standards: Vec::new(),
            sample_values: Vec::new(),
            units: BTreeSet::new(),
            files: HashSet::new(),
            total_occurrences: 0,
        }
    }

    /// Closes the aggregation stage and produces export rows ordered by
    /// file coverage (descending, ties in first-registration order).
    pub fn finalize(self) -> Vec<CatalogRow> {
        let total_documents = self.processed_documents;
        let mut entries = self.entries;
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.files.len()));

        entries
            .into_iter()
            .map(|entry| CatalogRow {
                xbrl_tag: entry.xbrl_tag,
                japanese_name: entry.japanese_name,
                english_name: entry.english_name,
                category: entry.category,
                accounting_standard: entry.standards.join(", "),
                sample_value: entry
                    .sample_values
                    .iter()
                    .take(SAMPLE_EXPORT)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
                unit: entry.units.iter().cloned().collect::<Vec<_>>().join(", "),
                description: entry.description,
                occurrence_detail: format!("{}/{}", entry.files.len(), total_documents),
            })
            .collect()
    }
}
