// src/narrative/mod.rs
pub mod render;
pub mod section;

// Re-export key narrative types for convenience
#[allow(unused_imports)]
pub use render::{render_json, render_markdown, render_text, OutputFormat};
#[allow(unused_imports)]
pub use section::{synthesize_sections, Section, SectionContent, SectionKind};
