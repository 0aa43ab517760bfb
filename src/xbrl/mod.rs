// src/xbrl/mod.rs
pub mod facts;
pub mod models;
pub mod resolver;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use facts::extract_facts;
#[allow(unused_imports)]
pub use models::{BasicInfo, DataType, Fact, NormalizedRecord, ResolvedTag};
#[allow(unused_imports)]
pub use resolver::{build_records, resolve_document, DocumentFacts};
