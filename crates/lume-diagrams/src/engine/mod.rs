//! Diagram engines.
//!
//! A [`DiagramEngine`] turns diagram source into SVG. Engines are blocking
//! and run on tokio's blocking pool; [`LazyEngine`] defers constructing one
//! until the first diagram actually needs it.

mod kroki;
mod mermaid;
mod source;

use std::sync::Arc;

use tokio::sync::OnceCell;

pub use kroki::KrokiEngine;
pub use mermaid::MermaidEngine;

use crate::language::DiagramLanguage;
use crate::theme::Theme;

/// Input for one engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRequest {
    pub language: DiagramLanguage,
    pub source: String,
    pub theme: Theme,
}

impl DiagramRequest {
    #[must_use]
    pub fn new(language: DiagramLanguage, source: impl Into<String>, theme: Theme) -> Self {
        Self {
            language,
            source: source.into(),
            theme,
        }
    }
}

/// Diagram rendering error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("unsupported diagram: {0}")]
    Unsupported(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("failed to load diagram engine: {0}")]
    Load(String),
    #[error("invalid engine output: {0}")]
    InvalidOutput(String),
    #[error("diagram engine crashed: {0}")]
    Crashed(String),
}

/// Renders diagram source to SVG.
pub trait DiagramEngine: Send + Sync {
    /// Render one diagram. Called from a blocking thread.
    fn render(&self, request: &DiagramRequest) -> Result<String, EngineError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

type Loader = Box<dyn Fn() -> Result<Arc<dyn DiagramEngine>, EngineError> + Send + Sync>;

/// Engine constructed on first use and kept for the lifetime of its owner.
///
/// A failed load is not cached: the diagrams that needed the engine fail and
/// the next diagram tries again.
pub struct LazyEngine {
    cell: OnceCell<Arc<dyn DiagramEngine>>,
    loader: Loader,
}

impl LazyEngine {
    /// Create an engine slot filled by `loader` on first use.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn DiagramEngine>, EngineError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// Create an already loaded slot.
    pub fn ready(engine: Arc<dyn DiagramEngine>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(engine)),
            loader: Box::new(|| Err(EngineError::Load("engine already loaded".to_owned()))),
        }
    }

    /// The engine, loading it if needed.
    pub async fn get(&self) -> Result<Arc<dyn DiagramEngine>, EngineError> {
        self.cell
            .get_or_try_init(|| async {
                let engine = (self.loader)()?;
                tracing::debug!(engine = engine.name(), "Loaded diagram engine");
                Ok::<_, EngineError>(engine)
            })
            .await
            .map(Arc::clone)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
