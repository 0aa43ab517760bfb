// src/narrative/render.rs

// --- Imports ---
use crate::narrative::section::{Section, SectionContent, SectionKind};
use serde_json::json;

// Paragraphs above this length are re-wrapped at sentence boundaries.
const WRAP_THRESHOLD_CHARS: usize = 200;

/// Output formats for the narrative view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[value(alias = "md")]
    Markdown,
    Txt,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
        }
    }

    pub fn render(self, sections: &[Section], title: &str) -> String {
        match self {
            OutputFormat::Markdown => render_markdown(sections, title),
            OutputFormat::Txt => render_text(sections, title),
            OutputFormat::Json => render_json(sections, title),
        }
    }
}

/// Renders sections as Markdown: `##`/`###` headings, pipe tables, long
/// paragraphs re-wrapped at sentence boundaries.
pub fn render_markdown(sections: &[Section], title: &str) -> String {
    let mut lines: Vec<String> = vec![format!("# {title}"), String::new(), "---".to_string(), String::new()];

    for section in sections {
        if section.level == 1 {
            lines.push(format!("## {}", section.heading));
        } else {
            lines.push(format!("### {}", section.heading));
        }
        lines.push(String::new());

        if section.kind == SectionKind::Table {
            render_markdown_table(section, &mut lines);
        } else {
            for paragraph in section.content.iter().filter_map(paragraph_text) {
                if paragraph.chars().count() > WRAP_THRESHOLD_CHARS {
                    wrap_long_paragraph(paragraph, &mut lines);
                } else {
                    lines.push(paragraph.to_string());
                }
                lines.push(String::new());
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn render_markdown_table(section: &Section, lines: &mut Vec<String>) {
    let mut rows = section.content.iter().filter_map(row_cells);
    let header = match rows.next() {
        Some(header) => header,
        None => return,
    };
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!("| {} |", vec!["---"; header.len()].join(" | ")));
    for row in rows {
        if !row.is_empty() {
            lines.push(format!("| {} |", row.join(" | ")));
        }
    }
}

/// Splits at sentence terminators and reflows: sentences accumulate until
/// adding the next one would exceed the threshold, never breaking inside a
/// sentence.
fn wrap_long_paragraph(paragraph: &str, lines: &mut Vec<String>) {
    let mut current = String::new();
    for sentence in split_sentences(paragraph) {
        if current.chars().count() + sentence.chars().count() > WRAP_THRESHOLD_CHARS {
            if !current.is_empty() {
                lines.push(current.trim().to_string());
                lines.push(String::new());
            }
            current = sentence;
        } else {
            current.push_str(&sentence);
        }
    }
    if !current.is_empty() {
        lines.push(current.trim().to_string());
    }
}

/// Sentence pieces with their `。`/`．` terminators kept attached.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if ch == '。' || ch == '．' {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Renders sections as plain text with banner headings and pipe-joined
/// table rows.
pub fn render_text(sections: &[Section], title: &str) -> String {
    let mut lines: Vec<String> = vec![
        title.to_string(),
        "=".repeat(title.chars().count()),
        String::new(),
    ];

    for section in sections {
        lines.push(format!("■ {}", section.heading));
        lines.push("-".repeat(section.heading.chars().count() + 2));
        lines.push(String::new());

        if section.kind == SectionKind::Table {
            for row in section.content.iter().filter_map(row_cells) {
                if !row.is_empty() {
                    lines.push(format!("  {}", row.join(" | ")));
                }
            }
        } else {
            for paragraph in section.content.iter().filter_map(paragraph_text) {
                if !paragraph.trim().is_empty() {
                    lines.push(paragraph.to_string());
                    lines.push(String::new());
                }
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Renders sections as pretty-printed JSON with per-section statistics.
pub fn render_json(sections: &[Section], title: &str) -> String {
    let rendered: Vec<serde_json::Value> = sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let statistics = if section.kind == SectionKind::Table {
                json!({ "rows": section.content.len() })
            } else {
                json!({
                    "paragraphs": section.content.len(),
                    "total_chars": section
                        .content
                        .iter()
                        .filter_map(paragraph_text)
                        .map(|p| p.chars().count())
                        .sum::<usize>(),
                })
            };
            json!({
                "id": i + 1,
                "heading": section.heading,
                "level": section.level,
                "type": section.kind,
                "content": section.content,
                "statistics": statistics,
            })
        })
        .collect();

    let document = json!({
        "title": title,
        "extraction_date": chrono::Local::now().format("%Y-%m-%d").to_string(),
        "total_sections": sections.len(),
        "sections": rendered,
    });

    // json! never produces a non-serializable value here.
    serde_json::to_string_pretty(&document).unwrap_or_default()
}

fn paragraph_text(content: &SectionContent) -> Option<&str> {
    match content {
        SectionContent::Paragraph(p) => Some(p.as_str()),
        SectionContent::Row(_) => None,
    }
}

fn row_cells(content: &SectionContent) -> Option<&Vec<String>> {
    match content {
        SectionContent::Paragraph(_) => None,
        SectionContent::Row(cells) => Some(cells),
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn narrative(heading: &str, level: u8, paragraphs: &[&str]) -> Section {
        Section {
            heading: heading.to_string(),
            level,
            kind: SectionKind::MainText,
            content: paragraphs
                .iter()
                .map(|p| SectionContent::Paragraph(p.to_string()))
                .collect(),
        }
    }

    fn table(rows: &[&[&str]]) -> Section {
        Section {
            heading: "データ表".to_string(),
            level: 2,
            kind: SectionKind::Table,
            content: rows
                .iter()
                .map(|r| SectionContent::Row(r.iter().map(|c| c.to_string()).collect()))
                .collect(),
        }
    }

    #[test]
    fn markdown_heading_levels() {
        let sections = vec![
            narrative("１．概況", 1, &["本文です。"]),
            narrative("（１）詳細", 2, &["本文です。"]),
        ];
        let md = render_markdown(&sections, "テスト");

        assert!(md.starts_with("# テスト\n\n---\n"));
        assert!(md.contains("## １．概況"));
        assert!(md.contains("### （１）詳細"));
    }

    #[test]
    fn markdown_table_uses_first_row_as_header() {
        let sections = vec![table(&[&["項目", "金額"], &["売上高", "100"], &[]])];
        let md = render_markdown(&sections, "t");

        assert!(md.contains("| 項目 | 金額 |"));
        assert!(md.contains("| --- | --- |"));
        assert!(md.contains("| 売上高 | 100 |"));
        assert!(!md.contains("|  |"), "empty rows are skipped");
    }

    #[test]
    fn markdown_rewraps_long_paragraphs_at_sentence_boundaries() {
        let a = "あ".repeat(150);
        let b = "い".repeat(120);
        let long = format!("{a}。{b}。");
        let sections = vec![narrative("見出し", 2, &[&long])];
        let md = render_markdown(&sections, "t");

        // 151 + 121 chars exceed the 200 threshold together, so the second
        // sentence starts a fresh line; neither sentence is split inside.
        assert!(md.contains(&format!("{a}。\n")));
        assert!(md.contains(&format!("{b}。")));
        assert!(!md.contains(&format!("{a}。{b}")));
    }

    #[test]
    fn text_banner_headings_and_table_rows() {
        let sections = vec![
            narrative("概況", 1, &["本文。"]),
            table(&[&["a", "b"], &["c", "d"]]),
        ];
        let txt = render_text(&sections, "タイトル");

        assert!(txt.starts_with("タイトル\n====\n"));
        assert!(txt.contains("■ 概況\n----\n"));
        assert!(txt.contains("  a | b\n  c | d"));
    }

    #[test]
    fn json_round_trip_preserves_counts() {
        let sections = vec![
            narrative("概況", 1, &["一文目。", "二文目。"]),
            table(&[&["h1", "h2"], &["v1", "v2"], &["v3", "v4"]]),
        ];
        let rendered = render_json(&sections, "タイトル");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed["total_sections"], 2);
        assert_eq!(parsed["sections"].as_array().unwrap().len(), sections.len());
        assert_eq!(parsed["sections"][0]["id"], 1);
        assert_eq!(parsed["sections"][0]["type"], "main_text");
        assert_eq!(parsed["sections"][0]["statistics"]["paragraphs"], 2);
        assert_eq!(parsed["sections"][0]["statistics"]["total_chars"], 8);
        assert_eq!(parsed["sections"][1]["statistics"]["rows"], 3);
        assert_eq!(parsed["sections"][1]["content"][0][0], "h1");
    }
}
