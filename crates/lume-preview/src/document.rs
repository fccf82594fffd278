//! Rendered documents and diagram events.

use lume_diagrams::{DiagramPlaceholder, DiagramState};
use lume_renderer::TocEntry;

/// Sanitized conversion result, shared through the render cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedMarkup {
    /// Sanitized markup with unstamped diagram placeholders.
    pub markup: String,
    pub outline: Vec<TocEntry>,
}

/// One render of a document.
///
/// The markup is never rewritten after construction. Diagram results are
/// applied to a [`LiveDocument`](crate::LiveDocument) holding it.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub generation: u64,
    /// Sanitized markup; placeholder elements carry their ids.
    pub markup: String,
    /// Headings in document order.
    pub outline: Vec<TocEntry>,
    /// One entry per diagram block, in document order.
    pub placeholders: Vec<DiagramPlaceholder>,
}

impl RenderedDocument {
    #[must_use]
    pub fn placeholder(&self, id: &str) -> Option<&DiagramPlaceholder> {
        self.placeholders.iter().find(|p| p.id == id)
    }

    /// Placeholders still waiting for the diagram pass.
    pub fn pending(&self) -> impl Iterator<Item = &DiagramPlaceholder> {
        self.placeholders
            .iter()
            .filter(|p| p.state() == DiagramState::Pending)
    }
}

/// A finished diagram job.
#[derive(Debug, Clone)]
pub struct DiagramEvent {
    /// Generation of the document the placeholder belongs to.
    pub generation: u64,
    pub placeholder_id: String,
    /// The placeholder in its final state.
    pub placeholder: DiagramPlaceholder,
}

impl DiagramEvent {
    #[must_use]
    pub fn new(generation: u64, placeholder: DiagramPlaceholder) -> Self {
        Self {
            generation,
            placeholder_id: placeholder.id.clone(),
            placeholder,
        }
    }

    #[must_use]
    pub fn state(&self) -> DiagramState {
        self.placeholder.state()
    }

    /// Figure to display (rendered diagram or error figure).
    #[must_use]
    pub fn markup(&self) -> Option<&str> {
        self.placeholder.rendered_markup()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.placeholder.error_message()
    }
}
