//! Diagram blocks for the preview pipeline.
//!
//! Diagram fences go through three stages:
//!
//! 1. [`PlaceholderProcessor`] turns each fence into an inert
//!    `<div class="lume-diagram">` during markdown conversion.
//! 2. [`extract_placeholders`] stamps every placeholder in the sanitized
//!    markup with a unique id and rejects blocks that are not diagrams.
//! 3. [`DiagramRenderer`] renders the remaining ones asynchronously, one
//!    isolated job per block, through a [`DiagramEngine`].
//!
//! Two engines are provided: [`MermaidEngine`] renders Mermaid in process
//! without any external service, [`KrokiEngine`] sends sources to a Kroki
//! server.
//!
//! # Example
//!
//! ```
//! use lume_diagrams::{DiagramState, PlaceholderProcessor, extract_placeholders};
//! use lume_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let html = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_processor(PlaceholderProcessor::new())
//!     .render_markdown("```diagram\nA --> B\n```")
//!     .html;
//!
//! let extraction = extract_placeholders(&html, 1);
//! assert_eq!(extraction.placeholders.len(), 1);
//! assert_eq!(extraction.placeholders[0].state(), DiagramState::Pending);
//! ```

mod cache;
pub mod consts;
mod embed;
mod engine;
mod extract;
mod language;
mod placeholder;
mod processor;
mod renderer;
mod theme;

pub use cache::{DiagramCache, DiagramKey};
pub use embed::{Fill, constrain_svg, error_figure, fill_placeholders};
pub use engine::{
    DiagramEngine, DiagramRequest, EngineError, KrokiEngine, LazyEngine, MermaidEngine,
};
pub use extract::{Extraction, extract_placeholders, placeholder_id, validate_source};
pub use language::DiagramLanguage;
pub use placeholder::{DiagramPlaceholder, DiagramState, SkipReason, TransitionError};
pub use processor::{PlaceholderProcessor, placeholder_element};
pub use renderer::DiagramRenderer;
pub use theme::{ParseThemeError, Theme};
