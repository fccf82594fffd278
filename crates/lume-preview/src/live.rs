//! The visible document.

use std::sync::Arc;

use lume_diagrams::{DiagramPlaceholder, DiagramState, Fill, SkipReason, fill_placeholders};
use lume_renderer::escape_html;

use crate::document::{DiagramEvent, RenderedDocument};
use crate::fence::GenerationFence;

/// The document currently on display, with diagram results applied.
///
/// Results are only accepted for the displayed generation, and only while
/// that generation is still the latest one issued by the fence.
#[derive(Debug)]
pub struct LiveDocument {
    fence: Arc<GenerationFence>,
    current: Option<RenderedDocument>,
}

impl LiveDocument {
    #[must_use]
    pub fn new(fence: Arc<GenerationFence>) -> Self {
        Self {
            fence,
            current: None,
        }
    }

    /// Display `doc`, replacing whatever was shown.
    pub fn show(&mut self, doc: RenderedDocument) {
        tracing::debug!(generation = doc.generation, "Showing document");
        self.current = Some(doc);
    }

    /// Generation on display.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|doc| doc.generation)
    }

    #[must_use]
    pub fn document(&self) -> Option<&RenderedDocument> {
        self.current.as_ref()
    }

    /// Write a diagram result into the displayed document.
    ///
    /// Returns `false` (and changes nothing) for results of another or a
    /// superseded generation, or for unknown placeholders.
    pub fn apply(&mut self, event: &DiagramEvent) -> bool {
        let Some(doc) = self.current.as_mut() else {
            return false;
        };
        if event.generation != doc.generation || !self.fence.is_current(event.generation) {
            tracing::debug!(
                generation = event.generation,
                displayed = doc.generation,
                placeholder = %event.placeholder_id,
                "Dropping stale diagram result"
            );
            return false;
        }

        let Some(slot) = doc
            .placeholders
            .iter_mut()
            .find(|p| p.id == event.placeholder_id)
        else {
            return false;
        };
        *slot = event.placeholder.clone();
        true
    }

    /// Markup to display.
    ///
    /// Rendered and failed diagrams are inlined, skipped stylesheet fragments
    /// are shown as code, empty blocks are removed and pending ones keep
    /// their source text.
    #[must_use]
    pub fn to_html(&self) -> String {
        let Some(doc) = &self.current else {
            return String::new();
        };
        if doc.placeholders.is_empty() {
            return doc.markup.clone();
        }
        fill_placeholders(&doc.markup, |id| {
            doc.placeholder(id).map_or(Fill::Keep, fill_for)
        })
    }
}

fn fill_for(placeholder: &DiagramPlaceholder) -> Fill {
    match placeholder.state() {
        DiagramState::Rendered | DiagramState::Failed => placeholder
            .rendered_markup()
            .map_or(Fill::Keep, |markup| Fill::Replace(markup.to_owned())),
        DiagramState::Skipped => match placeholder.skip_reason() {
            Some(SkipReason::StylesheetFragment) => Fill::Replace(format!(
                r#"<pre><code class="language-css">{}</code></pre>"#,
                escape_html(&placeholder.source)
            )),
            Some(SkipReason::Empty) | None => Fill::Remove,
        },
        DiagramState::Pending | DiagramState::Rendering => Fill::Keep,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use lume_diagrams::Theme;
    use pretty_assertions::assert_eq;

    use crate::{DiagramStream, Preview, PreviewOptions};

    use super::*;

    fn preview() -> Preview {
        Preview::new(PreviewOptions {
            settle_delay: Duration::from_millis(20),
            ..PreviewOptions::default()
        })
    }

    async fn collect(stream: DiagramStream) -> Vec<DiagramEvent> {
        stream.collect().await
    }

    #[test]
    fn test_empty_live_document() {
        let live = preview().live_document();
        assert_eq!(live.generation(), None);
        assert_eq!(live.to_html(), "");
    }

    #[test]
    fn test_without_diagrams_shows_markup() {
        let preview = preview();
        let mut live = preview.live_document();
        let doc = preview.render("# Hi");
        live.show(doc.clone());
        assert_eq!(live.generation(), Some(doc.generation));
        assert_eq!(live.to_html(), doc.markup);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_inlines_rendered_diagram() {
        let preview = preview();
        let mut live = preview.live_document();
        let doc = preview.render("Intro\n\n```diagram\nA-->B\n```\n\nOutro");
        live.show(doc.clone());

        let pending_html = live.to_html();
        assert!(pending_html.contains(r#"class="lume-diagram""#));
        assert!(pending_html.contains("A--&gt;B"));

        for event in collect(preview.fill_diagrams(&doc, Theme::Light)).await {
            assert!(live.apply(&event));
        }

        let html = live.to_html();
        assert!(html.starts_with("<p>Intro</p>"));
        assert!(html.ends_with("<p>Outro</p>"));
        assert!(html.contains(r#"<figure class="diagram"><svg"#));
        assert!(!html.contains("lume-diagram\""));
        assert_eq!(
            live.document().unwrap().placeholders[0].state(),
            DiagramState::Rendered
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_diagram_shows_error_figure() {
        let preview = preview();
        let mut live = preview.live_document();
        let doc = preview.render("```diagram\nA -->\n```");
        live.show(doc.clone());

        for event in collect(preview.fill_diagrams(&doc, Theme::Light)).await {
            live.apply(&event);
        }
        let html = live.to_html();
        assert!(html.starts_with(
            r#"<figure class="diagram diagram-error"><pre>Diagram rendering failed: "#
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_results_are_not_applied() {
        let preview = preview();
        let mut live = preview.live_document();

        let first = preview.render("```diagram\nA-->B\n```");
        live.show(first.clone());
        let events = collect(preview.fill_diagrams(&first, Theme::Light)).await;
        assert_eq!(events.len(), 1);

        let second = preview.render("```diagram\nC-->D\n```");
        assert!(!live.apply(&events[0]));

        live.show(second);
        assert!(!live.apply(&events[0]));
        assert!(!live.to_html().contains("<figure"));
    }

    #[test]
    fn test_event_for_other_document_rejected() {
        let preview = preview();
        let mut live = preview.live_document();
        let first = preview.render("```diagram\nA-->B\n```");
        let second = preview.render("```diagram\nA-->B\n```");
        live.show(second);

        let mut placeholder = first.placeholders[0].clone();
        placeholder.start_rendering().unwrap();
        placeholder.complete("<figure>x</figure>".to_owned()).unwrap();
        let event = DiagramEvent::new(first.generation, placeholder);
        assert!(!live.apply(&event));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let preview = preview();
        let mut live = preview.live_document();
        let doc = preview.render("```diagram\nA-->B\n```");
        live.show(doc.clone());

        let event = DiagramEvent::new(
            doc.generation,
            DiagramPlaceholder::new("elsewhere", 0, "diagram", "A-->B"),
        );
        assert!(!live.apply(&event));
    }

    #[test]
    fn test_skipped_blocks() {
        let preview = preview();
        let mut live = preview.live_document();
        let doc = preview.render(
            "```mermaid\n```\n\n```diagram\n.note { color: <red>; }\n```\n\n```diagram\nA-->B\n```",
        );
        live.show(doc);

        let html = live.to_html();
        assert!(html.starts_with(r#"<pre><code class="language-css">.note { color: &lt;red&gt;; }"#));
        assert_eq!(html.matches(r#"class="lume-diagram""#).count(), 1);
        assert!(html.contains("A--&gt;B"));
    }
}
