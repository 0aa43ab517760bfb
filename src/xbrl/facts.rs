// src/xbrl/facts.rs

// --- Imports ---
use crate::xbrl::models::Fact;
use scraper::{ElementRef, Html};

// Inline-XBRL role spellings. Tag names are matched case-insensitively so
// both `ix:nonNumeric` and already-lowercased `ix:nonnumeric` qualify.
const INLINE_FACT_ROLES: [&str; 2] = ["nonnumeric", "nonfraction"];

/// Extracts all inline-tagged facts from a parsed document, in document
/// order. Elements without a `name` attribute are skipped silently; this is
/// a pure scan with no side effects.
pub fn extract_facts(document: &Html) -> Vec<Fact> {
    let mut facts = Vec::new();

    for node in document.root_element().descendants() {
        let element = match ElementRef::wrap(node) {
            Some(el) => el,
            None => continue,
        };

        let tag = element.value().name().to_ascii_lowercase();
        if !INLINE_FACT_ROLES.iter().any(|role| tag.contains(role)) {
            continue;
        }

        let tag_name = match element.value().attr("name") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        let is_nil = has_nil_marker(element);

        // Nil forces an empty value regardless of whatever text the element
        // carries (some filings still render a placeholder glyph inside).
        let raw_text = if is_nil {
            String::new()
        } else {
            let mut text = element_text(element);
            if sign_attr(element) == Some('-') && !text.is_empty() {
                text.insert(0, '-');
            }
            text
        };

        facts.push(Fact {
            tag_name,
            raw_text,
            is_nil,
            sign: sign_attr(element),
            unit_ref: attr_case_insensitive(element, "unitref"),
            context_ref: attr_case_insensitive(element, "contextref"),
        });
    }

    tracing::debug!("Extracted {} inline facts", facts.len());
    facts
}

/// True when any attribute whose local name is `nil` (bare or namespaced,
/// e.g. `xsi:nil`) has the string value "true". Malformed values count as
/// absent.
fn has_nil_marker(element: ElementRef) -> bool {
    element.value().attrs().any(|(name, value)| {
        let name = name.to_ascii_lowercase();
        (name == "nil" || name.ends_with(":nil")) && value == "true"
    })
}

/// The `sign` attribute, reported only for the minus marker.
fn sign_attr(element: ElementRef) -> Option<char> {
    match element.value().attr("sign") {
        Some("-") => Some('-'),
        _ => None,
    }
}

/// Looks an attribute up by case-insensitive name (`unitRef` vs `unitref`
/// both occur in the wild). Empty values are reported as absent.
fn attr_case_insensitive(element: ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attrs()
        .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Element text the way the downstream rules expect it: each text fragment
/// trimmed, empties dropped, the rest concatenated.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn extracts_non_numeric_and_non_fraction_elements() {
        let html = r#"
            <html><body>
            <ix:nonNumeric name="tse-ed-t:CompanyName" contextRef="Current">Example Corp</ix:nonNumeric>
            <p>narrative text</p>
            <ix:nonFraction name="tse-ed-t:NetSales" contextRef="Current" unitRef="JPY">12,345</ix:nonFraction>
            </body></html>
        "#;
        let facts = extract_facts(&parse(html));

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].tag_name, "tse-ed-t:CompanyName");
        assert_eq!(facts[0].raw_text, "Example Corp");
        assert_eq!(facts[1].tag_name, "tse-ed-t:NetSales");
        assert_eq!(facts[1].raw_text, "12,345");
        assert_eq!(facts[1].unit_ref.as_deref(), Some("JPY"));
        assert_eq!(facts[1].context_ref.as_deref(), Some("Current"));
    }

    #[test]
    fn skips_elements_without_name_attribute() {
        let html = r#"<body><ix:nonFraction contextRef="c1">42</ix:nonFraction></body>"#;
        assert!(extract_facts(&parse(html)).is_empty());
    }

    #[test]
    fn nil_marker_forces_empty_text() {
        let html = r#"
            <body>
            <ix:nonFraction name="tse-ed-t:Dividend" xsi:nil="true">－</ix:nonFraction>
            <ix:nonFraction name="tse-ed-t:NetSales" nil="true">100</ix:nonFraction>
            <ix:nonFraction name="tse-ed-t:Profit" xsi:nil="false">5</ix:nonFraction>
            </body>
        "#;
        let facts = extract_facts(&parse(html));

        assert!(facts[0].is_nil);
        assert_eq!(facts[0].raw_text, "");
        assert!(facts[1].is_nil, "bare nil attribute must also count");
        assert_eq!(facts[1].raw_text, "");
        assert!(!facts[2].is_nil, "nil=\"false\" is not a nil marker");
        assert_eq!(facts[2].raw_text, "5");
    }

    #[test]
    fn sign_attribute_prefixes_minus() {
        let html = r#"
            <body>
            <ix:nonFraction name="t:OperatingLoss" sign="-">1,500</ix:nonFraction>
            <ix:nonFraction name="t:EmptySigned" sign="-"></ix:nonFraction>
            </body>
        "#;
        let facts = extract_facts(&parse(html));

        assert_eq!(facts[0].raw_text, "-1,500");
        assert_eq!(facts[0].sign, Some('-'));
        assert_eq!(facts[1].raw_text, "", "sign never applies to empty text");
    }

    #[test]
    fn nested_text_fragments_are_trimmed_and_joined() {
        let html = r#"<body><ix:nonNumeric name="t:Note"> a <span> b </span> c </ix:nonNumeric></body>"#;
        let facts = extract_facts(&parse(html));
        assert_eq!(facts[0].raw_text, "abc");
    }
}
