// src/disclosure/mod.rs
pub mod files;
pub mod models;

// Re-export key discovery types for convenience
#[allow(unused_imports)]
pub use files::{date_from_file_name, is_valid_code, list_code_dirs, list_documents};
#[allow(unused_imports)]
pub use models::DocumentInfo;
