// src/xbrl/resolver.rs

// --- Imports ---
use crate::mapping::TagMapping;
use crate::xbrl::models::{BasicInfo, Fact, NormalizedRecord, ResolvedTag};
use std::collections::HashMap;

/// Everything one document's facts reduce to: the basic-info metadata plus
/// one canonical value per remaining tag, in first-seen order.
#[derive(Debug, Default)]
pub struct DocumentFacts {
    pub basic_info: BasicInfo,
    pub tags: Vec<ResolvedTag>,
}

/// Resolves all fact occurrences of one document.
///
/// Precedence per tag: the first occurrence registers the tag; a later
/// occurrence overwrites only when the stored value is empty and the new
/// one is non-empty and non-nil. A later nil or empty occurrence never
/// displaces an informative value.
pub fn resolve_document(facts: &[Fact]) -> DocumentFacts {
    let mut basic_info = BasicInfo::default();
    let mut tags: Vec<ResolvedTag> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for fact in facts {
        if fact.tag_name.is_empty() {
            continue;
        }
        if basic_info.record(&fact.tag_name, &fact.raw_text) {
            continue;
        }

        match index.get(&fact.tag_name) {
            None => {
                index.insert(fact.tag_name.clone(), tags.len());
                tags.push(ResolvedTag {
                    tag_name: fact.tag_name.clone(),
                    value: fact.raw_text.clone(),
                    is_nil: fact.is_nil,
                });
            }
            Some(&slot) => {
                let stored = &mut tags[slot];
                if stored.value.is_empty() && !fact.raw_text.is_empty() && !fact.is_nil {
                    stored.value = fact.raw_text.clone();
                    stored.is_nil = false;
                }
            }
        }
    }

    DocumentFacts { basic_info, tags }
}

/// Builds one NormalizedRecord per resolved tag, joined with the document's
/// disclosure date and the Japanese name from the external mapping (empty
/// when unmapped).
pub fn build_records(date: &str, doc: &DocumentFacts, mapping: &TagMapping) -> Vec<NormalizedRecord> {
    doc.tags
        .iter()
        .map(|tag| NormalizedRecord {
            date: date.to_string(),
            filing_date: doc.basic_info.filing_date().to_string(),
            code: doc.basic_info.code().to_string(),
            company_name: doc.basic_info.company_name().to_string(),
            fiscal_year_end: doc.basic_info.fiscal_year_end().to_string(),
            quarterly_period: doc.basic_info.quarterly_period().to_string(),
            factor_tag: tag.tag_name.clone(),
            factor_jp: mapping.japanese_name(&tag.tag_name).to_string(),
            value: tag.value.clone(),
            has_value: tag.has_value(),
            is_nil: tag.is_nil,
            data_type: tag.data_type(),
        })
        .collect()
}
