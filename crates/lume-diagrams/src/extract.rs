//! Placeholder discovery in sanitized markup.
//!
//! [`extract_placeholders`] walks the markup once with `lol_html`, stamps every
//! `div.lume-diagram` with a fresh id and collects its source. Blocks that
//! cannot be diagrams are marked `Skipped` before anything is queued.

use std::cell::RefCell;

use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use uuid::Uuid;

use crate::consts::{ID_ATTR, LANGUAGE_ATTR, PLACEHOLDER_CLASS};
use crate::placeholder::{DiagramPlaceholder, SkipReason};

/// Markup with stamped placeholder ids, plus one placeholder per block.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub markup: String,
    pub placeholders: Vec<DiagramPlaceholder>,
}

#[derive(Default)]
struct Found {
    id: String,
    language: String,
    raw_text: String,
}

/// Mint a placeholder id.
///
/// Format: `lume-diagram-{generation}-{index}-{8 hex}`. The random suffix
/// keeps ids distinct across documents rendered with the same generation.
#[must_use]
pub fn placeholder_id(generation: u64, index: usize) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{PLACEHOLDER_CLASS}-{generation}-{index}-{}", &random[..8])
}

/// Decide whether a block should be skipped instead of rendered.
#[must_use]
pub fn validate_source(source: &str) -> Option<SkipReason> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Some(SkipReason::Empty);
    }
    if trimmed.contains('{') && trimmed.contains('}') && trimmed.starts_with(['.', '#', '@']) {
        return Some(SkipReason::StylesheetFragment);
    }
    None
}

/// Find diagram placeholders in `markup` and stamp them with ids.
///
/// Never fails: if the markup cannot be rewritten it is returned unchanged
/// with no placeholders.
#[must_use]
pub fn extract_placeholders(markup: &str, generation: u64) -> Extraction {
    if !markup.contains(PLACEHOLDER_CLASS) {
        return Extraction {
            markup: markup.to_owned(),
            placeholders: Vec::new(),
        };
    }

    let found: RefCell<Vec<Found>> = RefCell::new(Vec::new());
    let selector = format!("div.{PLACEHOLDER_CLASS}");

    let result = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(selector, |el| {
                    let mut found = found.borrow_mut();
                    let id = placeholder_id(generation, found.len());
                    el.set_attribute("id", &id)?;
                    el.set_attribute(ID_ATTR, &id)?;
                    found.push(Found {
                        id,
                        language: el.get_attribute(LANGUAGE_ATTR).unwrap_or_default(),
                        raw_text: String::new(),
                    });
                    Ok(())
                }),
                text!(selector, |t| {
                    if let Some(current) = found.borrow_mut().last_mut() {
                        current.raw_text.push_str(t.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    );

    let markup = match result {
        Ok(markup) => markup,
        Err(e) => {
            tracing::warn!(generation, error = %e, "Placeholder extraction failed");
            return Extraction {
                markup: markup.to_owned(),
                placeholders: Vec::new(),
            };
        }
    };

    let placeholders = found
        .into_inner()
        .into_iter()
        .enumerate()
        .map(|(index, f)| {
            let source = htmlize::unescape(&f.raw_text).into_owned();
            let mut placeholder = DiagramPlaceholder::new(f.id, index, f.language, source);
            if let Some(reason) = validate_source(&placeholder.source) {
                tracing::debug!(
                    generation,
                    placeholder = %placeholder.id,
                    %reason,
                    "Skipping diagram block"
                );
                // Freshly created placeholders are always Pending.
                let _ = placeholder.skip(reason);
            }
            placeholder
        })
        .collect();

    Extraction {
        markup,
        placeholders,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::placeholder::DiagramState;

    fn block(lang: &str, text: &str) -> String {
        format!(r#"<div class="lume-diagram" data-diagram-lang="{lang}">{text}</div>"#)
    }

    #[test]
    fn test_no_placeholders() {
        let extraction = extract_placeholders("<p>plain</p>", 1);
        assert_eq!(extraction.markup, "<p>plain</p>");
        assert!(extraction.placeholders.is_empty());
    }

    #[test]
    fn test_stamps_ids_and_unescapes_source() {
        let markup = format!("<h1>T</h1>{}", block("diagram", "A-&gt;B\n"));
        let extraction = extract_placeholders(&markup, 7);

        assert_eq!(extraction.placeholders.len(), 1);
        let p = &extraction.placeholders[0];
        assert_eq!(p.source, "A->B\n");
        assert_eq!(p.language, "diagram");
        assert_eq!(p.index, 0);
        assert_eq!(p.state(), DiagramState::Pending);
        assert!(p.id.starts_with("lume-diagram-7-0-"));
        assert!(extraction.markup.contains(&format!(r#"id="{}""#, p.id)));
        assert!(extraction.markup.contains(&format!(r#"data-diagram-id="{}""#, p.id)));
    }

    #[test]
    fn test_id_format() {
        let id = placeholder_id(12, 3);
        let suffix = id.strip_prefix("lume-diagram-12-3-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_unique_across_repeated_extraction() {
        let markup = block("mermaid", "graph TD");
        let a = extract_placeholders(&markup, 1);
        let b = extract_placeholders(&markup, 1);
        assert_ne!(a.placeholders[0].id, b.placeholders[0].id);
    }

    #[test]
    fn test_indexes_follow_document_order() {
        let markup = [
            block("mermaid", "graph TD\nA-->B"),
            "<p>between</p>".to_owned(),
            block("diagram", "C->D"),
        ]
        .concat();
        let extraction = extract_placeholders(&markup, 2);
        let sources: Vec<_> = extraction
            .placeholders
            .iter()
            .map(|p| (p.index, p.source.as_str()))
            .collect();
        assert_eq!(sources, vec![(0, "graph TD\nA-->B"), (1, "C->D")]);
    }

    #[test]
    fn test_empty_block_is_skipped() {
        let extraction = extract_placeholders(&block("mermaid", "  \n "), 1);
        let p = &extraction.placeholders[0];
        assert_eq!(p.state(), DiagramState::Skipped);
        assert_eq!(p.skip_reason(), Some(SkipReason::Empty));
    }

    #[test]
    fn test_stylesheet_fragment_is_skipped() {
        let extraction = extract_placeholders(&block("diagram", ".foo { color: red; }"), 1);
        let p = &extraction.placeholders[0];
        assert_eq!(p.state(), DiagramState::Skipped);
        assert_eq!(p.skip_reason(), Some(SkipReason::StylesheetFragment));
    }

    #[test]
    fn test_validate_source() {
        assert_eq!(validate_source(""), Some(SkipReason::Empty));
        assert_eq!(validate_source("#main { margin: 0 }"), Some(SkipReason::StylesheetFragment));
        assert_eq!(
            validate_source("@media print { body { color: black } }"),
            Some(SkipReason::StylesheetFragment)
        );
        assert_eq!(validate_source("graph TD\nA{Decision}-->B"), None);
        assert_eq!(validate_source(".foo"), None);
        assert_eq!(validate_source("digraph { a -> b }"), None);
    }

    #[test]
    fn test_other_divs_untouched() {
        let markup = r#"<div class="note">x</div>"#;
        let extraction = extract_placeholders(&format!("{markup}{}", block("diagram", "A")), 1);
        assert!(extraction.markup.starts_with(markup));
        assert_eq!(extraction.placeholders.len(), 1);
    }
}
