//! Diagram placeholder lifecycle.
//!
//! ```text
//! Pending ──> Rendering ──> Rendered
//!    │                 └──> Failed
//!    └──> Skipped
//! ```
//!
//! Any other move is rejected with [`TransitionError`].

use std::fmt;

/// Rendering state of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramState {
    Pending,
    Rendering,
    Rendered,
    Failed,
    Skipped,
}

impl DiagramState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Rendering => "rendering",
            Self::Rendered => "rendered",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rendered | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for DiagramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate block is not rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Source is empty or whitespace.
    Empty,
    /// Source looks like CSS rules rather than diagram notation.
    StylesheetFragment,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty source",
            Self::StylesheetFragment => "stylesheet fragment",
        })
    }
}

/// Illegal state move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("placeholder {id}: cannot move from {from} to {to}")]
pub struct TransitionError {
    pub id: String,
    pub from: DiagramState,
    pub to: DiagramState,
}

/// One diagram block found in a rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramPlaceholder {
    /// Unique id, also stamped on the placeholder element.
    pub id: String,
    /// Position among the document's placeholders.
    pub index: usize,
    /// Canonical language name from the placeholder element.
    pub language: String,
    /// Literal diagram source.
    pub source: String,
    state: DiagramState,
    rendered_markup: Option<String>,
    error_message: Option<String>,
    skip_reason: Option<SkipReason>,
}

impl DiagramPlaceholder {
    /// Create a `Pending` placeholder.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        index: usize,
        language: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index,
            language: language.into(),
            source: source.into(),
            state: DiagramState::Pending,
            rendered_markup: None,
            error_message: None,
            skip_reason: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> DiagramState {
        self.state
    }

    /// Markup to show in place of the block (`Rendered` or `Failed` only).
    #[must_use]
    pub fn rendered_markup(&self) -> Option<&str> {
        self.rendered_markup.as_deref()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        self.skip_reason
    }

    /// `Pending → Rendering`.
    pub fn start_rendering(&mut self) -> Result<(), TransitionError> {
        self.transition(DiagramState::Pending, DiagramState::Rendering)
    }

    /// `Rendering → Rendered`.
    pub fn complete(&mut self, markup: String) -> Result<(), TransitionError> {
        self.transition(DiagramState::Rendering, DiagramState::Rendered)?;
        self.rendered_markup = Some(markup);
        Ok(())
    }

    /// `Rendering → Failed`, keeping a fallback figure to display.
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        fallback_markup: String,
    ) -> Result<(), TransitionError> {
        self.transition(DiagramState::Rendering, DiagramState::Failed)?;
        self.error_message = Some(message.into());
        self.rendered_markup = Some(fallback_markup);
        Ok(())
    }

    /// `Pending → Skipped`.
    pub fn skip(&mut self, reason: SkipReason) -> Result<(), TransitionError> {
        self.transition(DiagramState::Pending, DiagramState::Skipped)?;
        self.skip_reason = Some(reason);
        Ok(())
    }

    fn transition(
        &mut self,
        expected: DiagramState,
        to: DiagramState,
    ) -> Result<(), TransitionError> {
        if self.state != expected {
            return Err(TransitionError {
                id: self.id.clone(),
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
