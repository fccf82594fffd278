//! Code block processor for diagram languages.
//!
//! [`PlaceholderProcessor`] implements [`CodeBlockProcessor`] so that diagram
//! fences leave the converter as inert placeholder elements. The literal
//! source is kept as the element's (escaped) text; nothing is interpreted
//! until the asynchronous diagram pass.

use std::collections::HashMap;

use lume_renderer::{CodeBlockProcessor, ProcessResult, escape_html};

use crate::consts::{LANGUAGE_ATTR, PLACEHOLDER_CLASS};
use crate::language::DiagramLanguage;

/// Turns diagram fences into `<div class="lume-diagram">` placeholders.
///
/// # Example
///
/// ```
/// use lume_diagrams::PlaceholderProcessor;
/// use lume_renderer::{HtmlBackend, MarkdownRenderer};
///
/// let result = MarkdownRenderer::<HtmlBackend>::new()
///     .with_processor(PlaceholderProcessor::new())
///     .render_markdown("```mermaid\ngraph TD\nA-->B\n```");
/// assert_eq!(
///     result.html,
///     r#"<div class="lume-diagram" data-diagram-lang="mermaid">graph TD
/// A--&gt;B
/// </div>"#
/// );
/// ```
#[derive(Debug, Default)]
pub struct PlaceholderProcessor {
    count: usize,
}

impl PlaceholderProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of placeholders emitted so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl CodeBlockProcessor for PlaceholderProcessor {
    fn process(
        &mut self,
        language: &str,
        _attrs: &HashMap<String, String>,
        source: &str,
        _index: usize,
    ) -> ProcessResult {
        let Some(lang) = DiagramLanguage::parse(language) else {
            return ProcessResult::PassThrough;
        };
        self.count += 1;
        ProcessResult::Inline(placeholder_element(lang, source))
    }
}

/// Placeholder markup for one diagram block.
#[must_use]
pub fn placeholder_element(language: DiagramLanguage, source: &str) -> String {
    format!(
        r#"<div class="{PLACEHOLDER_CLASS}" {LANGUAGE_ATTR}="{}">{}</div>"#,
        language.as_str(),
        escape_html(source)
    )
}

#[cfg(test)]
mod tests {
    use lume_renderer::{HtmlBackend, MarkdownRenderer};
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> String {
        MarkdownRenderer::<HtmlBackend>::new()
            .with_processor(PlaceholderProcessor::new())
            .render_markdown(markdown)
            .html
    }

    #[test]
    fn test_diagram_fence_becomes_placeholder() {
        assert_eq!(
            render("```diagram\nA->B\n```"),
            r#"<div class="lume-diagram" data-diagram-lang="diagram">A-&gt;B
</div>"#
        );
    }

    #[test]
    fn test_language_is_canonicalized() {
        let html = render("```kroki-dot\ndigraph { a -> b }\n```");
        assert!(html.contains(r#"data-diagram-lang="graphviz""#));
    }

    #[test]
    fn test_ordinary_code_passes_through() {
        let html = render("```css\n.foo { color: red; }\n```");
        assert!(html.contains(r#"class="language-css""#));
        assert!(!html.contains(PLACEHOLDER_CLASS));
    }

    #[test]
    fn test_source_markup_is_escaped() {
        let html = render("```mermaid\nA[\"<img src=x onerror=alert(1)>\"]\n```");
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_count() {
        let mut processor = PlaceholderProcessor::new();
        let attrs = HashMap::new();
        processor.process("mermaid", &attrs, "graph TD", 0);
        processor.process("rust", &attrs, "fn main() {}", 1);
        assert_eq!(processor.count(), 1);
    }
}
