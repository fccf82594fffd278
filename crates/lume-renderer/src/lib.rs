//! Markdown to HTML conversion for the preview pipeline.
//!
//! This crate provides a [`MarkdownRenderer`] that turns CommonMark + GFM source
//! into HTML through the [`RenderBackend`] trait. The renderer itself is pure:
//! the same input always produces the same output, and malformed markup degrades
//! to escaped text instead of failing.
//!
//! # Architecture
//!
//! - [`HtmlBackend`]: semantic HTML5 output (code blocks keep their language
//!   class, math is wrapped in `math` containers for client-side typesetting)
//! - [`CodeBlockProcessor`]: hook for fenced blocks that need special handling,
//!   such as diagram notations that are rendered later
//!
//! The output is *not* safe to display as-is. Raw HTML in the source passes
//! through untouched and must be sanitized downstream.
//!
//! # Example
//!
//! ```
//! use lume_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let result = MarkdownRenderer::<HtmlBackend>::new().render_markdown("# Hello\n\n**Bold** text");
//! assert!(result.html.contains("<strong>Bold</strong>"));
//! ```

mod backend;
mod code_block;
mod html;
mod renderer;
mod state;

pub use backend::RenderBackend;
pub use code_block::{CodeBlockProcessor, ProcessResult};
pub use html::HtmlBackend;
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
