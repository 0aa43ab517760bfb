// src/xbrl/models.rs
#![allow(dead_code)]
use serde::Serialize;

/// Basic-info tags describe the document itself rather than a financial
/// metric. They populate `BasicInfo` and never become NormalizedRecords.
pub const BASIC_INFO_TAGS: [&str; 5] = [
    "tse-ed-t:FilingDate",
    "tse-ed-t:SecuritiesCode",
    "tse-ed-t:CompanyName",
    "tse-ed-t:FiscalYearEnd",
    "tse-ed-t:QuarterlyPeriod",
];

/// One raw occurrence of an inline-tagged value in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    pub tag_name: String,
    pub raw_text: String,
    pub is_nil: bool,
    pub sign: Option<char>,
    pub unit_ref: Option<String>,
    pub context_ref: Option<String>,
}

/// Document-level metadata assembled from the basic-info tags.
/// Each field latches on the first occurrence of its tag.
#[derive(Debug, Clone, Default)]
pub struct BasicInfo {
    filing_date: Option<String>,
    code: Option<String>,
    company_name: Option<String>,
    fiscal_year_end: Option<String>,
    quarterly_period: Option<String>,
}

impl BasicInfo {
    /// Records `value` if `tag_name` is a basic-info tag. Returns true when
    /// the tag was consumed (even if a prior occurrence already latched it).
    pub fn record(&mut self, tag_name: &str, value: &str) -> bool {
        let slot = match tag_name {
            "tse-ed-t:FilingDate" => &mut self.filing_date,
            "tse-ed-t:SecuritiesCode" => &mut self.code,
            "tse-ed-t:CompanyName" => &mut self.company_name,
            "tse-ed-t:FiscalYearEnd" => &mut self.fiscal_year_end,
            "tse-ed-t:QuarterlyPeriod" => &mut self.quarterly_period,
            _ => return false,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
        true
    }

    pub fn filing_date(&self) -> &str {
        self.filing_date.as_deref().unwrap_or("")
    }

    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    pub fn company_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or("")
    }

    pub fn fiscal_year_end(&self) -> &str {
        self.fiscal_year_end.as_deref().unwrap_or("")
    }

    pub fn quarterly_period(&self) -> &str {
        self.quarterly_period.as_deref().unwrap_or("")
    }
}

/// Classification of a resolved tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Nil,
    Empty,
    Value,
}

/// The canonical value a tag resolved to within one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTag {
    pub tag_name: String,
    pub value: String,
    pub is_nil: bool,
}

impl ResolvedTag {
    pub fn has_value(&self) -> bool {
        !self.value.trim().is_empty()
    }

    pub fn data_type(&self) -> DataType {
        if self.is_nil {
            DataType::Nil
        } else if !self.has_value() {
            DataType::Empty
        } else {
            DataType::Value
        }
    }
}

/// One row of the tabular time-series output. Field order is the CSV
/// column order consumed downstream.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedRecord {
    pub date: String,
    pub filing_date: String,
    pub code: String,
    pub company_name: String,
    pub fiscal_year_end: String,
    pub quarterly_period: String,
    pub factor_tag: String,
    pub factor_jp: String,
    pub value: String,
    pub has_value: bool,
    pub is_nil: bool,
    pub data_type: DataType,
}
