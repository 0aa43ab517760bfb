// src/narrative/section.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef, Html};
use serde::Serialize;

// --- Constants ---
// Fragments below this length never reach role classification.
const MIN_FRAGMENT_CHARS: usize = 10;
// Unclassed fragments above this length are treated as body text.
const MAIN_TEXT_THRESHOLD_CHARS: usize = 50;
// Paragraphs above this length are split at sentence terminators.
const SPLIT_THRESHOLD_CHARS: usize = 500;
// Split sentences at or below this length are discarded.
const MIN_SENTENCE_CHARS: usize = 20;
// A table needs a header row plus at least one data row.
const MIN_TABLE_ROWS: usize = 2;

const FALLBACK_HEADING: &str = "その他の情報";
const TABLE_HEADING: &str = "データ表";

// Elements whose close turns the accumulated text into a fragment.
const FRAGMENT_ELEMENTS: [&str; 7] = ["p", "div", "h1", "h2", "h3", "h4", "td"];

/// Role a fragment plays, decided by style class, element kind, or length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentRole {
    MainText,
    Heading,
    TableData,
    Other,
}

impl ContentRole {
    fn section_kind(self) -> SectionKind {
        match self {
            ContentRole::MainText => SectionKind::MainText,
            ContentRole::Heading => SectionKind::Heading,
            ContentRole::TableData | ContentRole::Other => SectionKind::Other,
        }
    }
}

/// Kind of a finished narrative section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    MainText,
    Heading,
    Table,
    Other,
}

/// One content entry: a narrative paragraph or a table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionContent {
    Paragraph(String),
    Row(Vec<String>),
}

/// A node of narrative content. Retained in the final output only when
/// `content` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub level: u8,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: Vec<SectionContent>,
}

// --- Rule tables ---
// Style-class token → role. Checked in order, substring match, first wins.
static CONTENT_CLASS_ROLES: &[(&str, ContentRole)] = &[
    ("smt_text6", ContentRole::MainText),
    ("smt_text1", ContentRole::MainText),
    ("smt_text2", ContentRole::MainText),
    ("smt_text3", ContentRole::MainText),
    ("smt_head1", ContentRole::Heading),
    ("smt_head2", ContentRole::Heading),
    ("smt_head3", ContentRole::Heading),
    ("smt_tblL", ContentRole::TableData),
    ("smt_tblC", ContentRole::TableData),
    ("smt_tblR", ContentRole::TableData),
];

struct HeadingRule {
    pattern: Regex,
    level: u8,
}

// Ordered heading patterns, first match wins. Full-width numerals and
// punctuation occur throughout these filings.
static HEADING_RULES: Lazy<Vec<HeadingRule>> = Lazy::new(|| {
    [
        (r"^[１-９\d][．.]", 1), // 1． major section
        (r"^[（(][１-９\d]+[）)]", 2), // （1） subsection
        (r"^○", 1),             // ○ table-of-contents style
        (r"概況\s*$", 2),        // ends in "overview"
        (r"予想.*説明\s*$", 2),  // forecast/explanation trailer
    ]
    .iter()
    .filter_map(|(pat, level)| {
        Regex::new(pat).ok().map(|pattern| HeadingRule { pattern, level: *level })
    })
    .collect()
});

// Fragments matching any of these are dropped before being appended.
static NOISE_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^.*[….]+P\d+\s*$",          // table-of-contents page trailer
        r"^[　\s]*$",                  // whitespace only (incl. full-width)
        r"^\(単位[：:][^)]+\)\s*$",    // unit annotation
        r"^[\d,\s]+$",                 // digits and commas only
        r"^[－\-\s]+$",               // dashes only
    ]
    .iter()
    .filter_map(|pat| Regex::new(pat).ok())
    .collect()
});

/// The heading level a fragment would start a section at, or None for
/// non-heading text.
pub fn heading_level(text: &str) -> Option<u8> {
    HEADING_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map(|rule| rule.level)
}

/// True for fragments that carry no narrative content.
pub fn is_noise(text: &str) -> bool {
    NOISE_RULES.iter().any(|rule| rule.is_match(text))
}

// --- Synthesizer ---

/// Builds the ordered section list for one parsed document. This pass is
/// independent of fact extraction; both walk the same `Html`.
pub fn synthesize_sections(document: &Html) -> Vec<Section> {
    let mut builder = SectionBuilder::new();
    walk_element(document.root_element(), &mut builder);
    builder.finish()
}

fn walk_element(element: ElementRef, builder: &mut SectionBuilder) {
    builder.open_element(element.value().name(), element.value().attr("class"));
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk_element(child_element, builder);
        } else if let Node::Text(text) = child.value() {
            builder.text(text);
        }
    }
    builder.close_element(element.value().name());
}

/// Event-driven state machine over the document stream. Text accumulates
/// into a buffer attributed to the most recently opened element; the buffer
/// and attribution reset on every element close.
struct SectionBuilder {
    current_tag: Option<String>,
    current_class: Option<String>,
    current_text: String,
    sections: Vec<Section>,
    current_section: Option<Section>,
    in_table: bool,
    table_rows: Vec<Vec<String>>,
    table_row: Option<Vec<String>>,
}

impl SectionBuilder {
    fn new() -> Self {
        Self {
            current_tag: None,
            current_class: None,
            current_text: String::new(),
            sections: Vec::new(),
            current_section: None,
            in_table: false,
            table_rows: Vec::new(),
            table_row: None,
        }
    }

    fn open_element(&mut self, name: &str, class: Option<&str>) {
        self.current_tag = Some(name.to_string());
        self.current_class = class.map(str::to_string);

        if name == "table" {
            self.in_table = true;
            self.table_rows.clear();
        } else if name == "tr" && self.in_table {
            self.table_row = Some(Vec::new());
        }
    }

    fn text(&mut self, data: &str) {
        let data = data.trim();
        if data.is_empty() {
            return;
        }
        self.current_text.push_str(data);
        self.current_text.push(' ');

        if self.in_table {
            if let Some(row) = &mut self.table_row {
                row.push(data.to_string());
            }
        }
    }

    fn close_element(&mut self, name: &str) {
        if name == "table" {
            self.in_table = false;
            self.close_table();
        } else if name == "tr" && self.in_table {
            if let Some(row) = self.table_row.take() {
                if !row.is_empty() {
                    self.table_rows.push(row);
                }
            }
        } else if FRAGMENT_ELEMENTS.contains(&name) {
            let text = self.current_text.trim().to_string();
            if !text.is_empty() {
                self.process_fragment(&text);
            }
        }

        self.current_text.clear();
        self.current_tag = None;
        self.current_class = None;
    }

    fn finish(mut self) -> Vec<Section> {
        self.flush_current();
        self.sections
    }

    fn process_fragment(&mut self, text: &str) {
        if text.chars().count() < MIN_FRAGMENT_CHARS {
            return;
        }
        let role = self.classify_role(text);

        if let Some(level) = heading_level(text) {
            tracing::trace!("Heading (level {}): '{}'", level, text);
            self.start_section(text, level, role.section_kind());
        } else if role == ContentRole::MainText {
            self.append_paragraph(text);
        }
    }

    /// Role priority: style-class table, then element kind, then length.
    fn classify_role(&self, text: &str) -> ContentRole {
        if let Some(class) = &self.current_class {
            for (token, role) in CONTENT_CLASS_ROLES {
                if class.contains(token) {
                    return *role;
                }
            }
        }
        match self.current_tag.as_deref() {
            Some("h1" | "h2" | "h3" | "h4") => ContentRole::Heading,
            _ if text.chars().count() > MAIN_TEXT_THRESHOLD_CHARS => ContentRole::MainText,
            _ => ContentRole::Other,
        }
    }

    fn start_section(&mut self, heading: &str, level: u8, kind: SectionKind) {
        self.flush_current();
        self.current_section = Some(Section {
            heading: heading.to_string(),
            level,
            kind,
            content: Vec::new(),
        });
    }

    fn append_paragraph(&mut self, text: &str) {
        if is_noise(text) {
            tracing::trace!("Dropped noise fragment: '{}'", text);
            return;
        }
        // With no section open there is nothing to flush, so the fallback
        // section can be created in place.
        let section = self.current_section.get_or_insert_with(|| Section {
            heading: FALLBACK_HEADING.to_string(),
            level: 2,
            kind: SectionKind::MainText,
            content: Vec::new(),
        });

        if text.chars().count() > SPLIT_THRESHOLD_CHARS {
            for sentence in text.split(['。', '．']) {
                let sentence = sentence.trim();
                if sentence.chars().count() > MIN_SENTENCE_CHARS {
                    section
                        .content
                        .push(SectionContent::Paragraph(format!("{sentence}。")));
                }
            }
        } else {
            section.content.push(SectionContent::Paragraph(text.to_string()));
        }
    }

    /// Tables append straight to the finished list and never merge into the
    /// open narrative section.
    fn close_table(&mut self) {
        let rows = std::mem::take(&mut self.table_rows);
        if rows.len() < MIN_TABLE_ROWS {
            return;
        }
        self.sections.push(Section {
            heading: TABLE_HEADING.to_string(),
            level: 2,
            kind: SectionKind::Table,
            content: rows.into_iter().map(SectionContent::Row).collect(),
        });
    }

    fn flush_current(&mut self) {
        if let Some(section) = self.current_section.take() {
            if !section.content.is_empty() {
                self.sections.push(section);
            }
        }
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn synthesize(html: &str) -> Vec<Section> {
        synthesize_sections(&Html::parse_document(html))
    }

    fn paragraphs(section: &Section) -> Vec<&str> {
        section
            .content
            .iter()
            .filter_map(|c| match c {
                SectionContent::Paragraph(p) => Some(p.as_str()),
                SectionContent::Row(_) => None,
            })
            .collect()
    }

    #[test]
    fn heading_rules_match_in_order() {
        assert_eq!(heading_level("1．経営成績に関する概要"), Some(1));
        assert_eq!(heading_level("１．当期の経営成績"), Some(1));
        assert_eq!(heading_level("（1）連結経営成績の詳細"), Some(2));
        assert_eq!(heading_level("(２) 財政状態"), Some(2));
        assert_eq!(heading_level("○添付資料の目次"), Some(1));
        assert_eq!(heading_level("当期における当社グループの概況"), Some(2));
        assert_eq!(heading_level("今後の業績予想に関する説明"), Some(2));
        assert_eq!(heading_level("ただの本文です。"), None);
    }

    #[test]
    fn noise_rules_drop_page_trailers_and_fillers() {
        assert!(is_noise("……………P3"));
        assert!(is_noise("目次……………P12 "));
        assert!(is_noise("－－－"));
        assert!(is_noise("(単位：百万円)"));
        assert!(is_noise("1,234 567"));
        assert!(is_noise("　　"));
        assert!(!is_noise("当期の売上高は増加しました。"));
    }

    #[test]
    fn heading_starts_new_section_and_collects_body() {
        let html = r#"
            <html><body>
            <div class="smt_head1">１．経営成績等の概況に関する説明</div>
            <p class="smt_text1">当連結会計年度におけるわが国経済は、緩やかな回復基調で推移しました。</p>
            <p class="smt_text1">……………P3</p>
            <div class="smt_head1">２．会計基準の選択に関する基本的な考え方</div>
            <p class="smt_text1">当社グループは日本基準を採用しております。比較可能性を考慮したものです。</p>
            </body></html>
        "#;
        let sections = synthesize(html);

        assert_eq!(sections.len(), 2, "got: {:?}", sections);
        assert_eq!(sections[0].heading, "１．経営成績等の概況に関する説明");
        assert_eq!(sections[0].level, 1);
        assert_eq!(sections[0].kind, SectionKind::Heading);
        assert_eq!(paragraphs(&sections[0]).len(), 1, "page trailer must be dropped");
        assert_eq!(sections[1].heading, "２．会計基準の選択に関する基本的な考え方");
    }

    #[test]
    fn body_without_heading_falls_back_to_generic_section() {
        let html = r#"<body><p class="smt_text1">本文が見出しより先に現れる場合のフォールバック動作を確認します。</p></body>"#;
        let sections = synthesize(html);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "その他の情報");
        assert_eq!(sections[0].level, 2);
        assert_eq!(sections[0].kind, SectionKind::MainText);
    }

    #[test]
    fn short_fragments_are_discarded() {
        let html = r#"<body><p class="smt_text1">短い文</p></body>"#;
        assert!(synthesize(html).is_empty());
    }

    #[test]
    fn unclassed_long_text_counts_as_main_text() {
        let html = r#"<body><div>この段落にはスタイルクラスがありませんが、五十文字を超える長さがあるため本文として扱われることを確認するテキストです。</div></body>"#;
        let sections = synthesize(html);
        assert_eq!(sections.len(), 1);
        assert_eq!(paragraphs(&sections[0]).len(), 1);
    }

    #[test]
    fn long_paragraph_splits_at_sentence_terminators() {
        let first = "あ".repeat(300);
        let second = "い".repeat(210);
        let html = format!(
            r#"<body><p class="smt_text1">{}。{}。短文。</p></body>"#,
            first, second
        );
        let sections = synthesize(&html);

        let body = paragraphs(&sections[0]);
        assert_eq!(body.len(), 2, "the trailing short sentence must be dropped");
        assert_eq!(body[0], format!("{}。", first));
        assert_eq!(body[1], format!("{}。", second));
    }

    #[test]
    fn tables_need_at_least_two_rows() {
        let single_row = r#"<body><table><tr><td>売上高</td><td>営業利益</td></tr></table></body>"#;
        assert!(synthesize(single_row).is_empty(), "header-only tables are discarded");

        let two_rows = r#"
            <body><table>
            <tr><td>項目</td><td>金額</td></tr>
            <tr><td>売上高</td><td>12,345</td></tr>
            </table></body>
        "#;
        let sections = synthesize(two_rows);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "データ表");
        assert_eq!(sections[0].kind, SectionKind::Table);
        assert_eq!(sections[0].content.len(), 2);
        assert_eq!(
            sections[0].content[1],
            SectionContent::Row(vec!["売上高".to_string(), "12,345".to_string()])
        );
    }

    #[test]
    fn table_does_not_merge_into_open_section() {
        let html = r#"
            <html><body>
            <div class="smt_head1">１．経営成績等の概況についての説明</div>
            <p class="smt_text1">当期の業績は以下の表のとおりとなりました。詳細は後述します。</p>
            <table>
            <tr><td>項目</td><td>金額</td></tr>
            <tr><td>売上高</td><td>100</td></tr>
            </table>
            <p class="smt_text1">以上のとおり、当期は増収増益を確保する結果となりました。</p>
            </body></html>
        "#;
        let sections = synthesize(html);

        // Table lands first (flushed at </table>), the narrative section
        // keeps accumulating and flushes at end of document.
        assert_eq!(sections.len(), 2, "got: {:?}", sections);
        assert_eq!(sections[0].kind, SectionKind::Table);
        assert_eq!(sections[1].kind, SectionKind::Heading);
        assert_eq!(paragraphs(&sections[1]).len(), 2);
    }

    #[test]
    fn open_section_flushes_at_end_of_document() {
        let html = r#"
            <body>
            <div class="smt_head2">（１）当期の経営成績の概況</div>
            <p class="smt_text2">営業利益は前期比で大幅な増加となり、過去最高を更新しました。</p>
            </body>
        "#;
        let sections = synthesize(html);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].level, 2);
    }

    #[test]
    fn empty_heading_only_section_is_not_emitted() {
        let html = r#"<body><div class="smt_head1">１．見出しだけで本文がない場合</div></body>"#;
        assert!(synthesize(html).is_empty());
    }
}
