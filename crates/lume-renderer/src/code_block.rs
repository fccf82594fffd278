//! Code block processor trait for extensible fenced block handling.
//!
//! Processors are registered with the renderer and consulted in order when a
//! fenced code block with a language tag is closed. The first processor that
//! returns something other than [`ProcessResult::PassThrough`] wins.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use lume_renderer::{CodeBlockProcessor, ProcessResult, escape_html};
//!
//! struct ChartProcessor;
//!
//! impl CodeBlockProcessor for ChartProcessor {
//!     fn process(
//!         &mut self,
//!         language: &str,
//!         _attrs: &HashMap<String, String>,
//!         source: &str,
//!         _index: usize,
//!     ) -> ProcessResult {
//!         if language == "chart" {
//!             ProcessResult::Inline(format!(r#"<div class="chart">{}</div>"#, escape_html(source)))
//!         } else {
//!             ProcessResult::PassThrough
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

/// Result of processing a code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Replace the code block with this HTML.
    ///
    /// The processor is responsible for escaping any source text it embeds.
    Inline(String),

    /// Render as a regular code block.
    PassThrough,
}

/// Trait for processing special code blocks.
pub trait CodeBlockProcessor {
    /// Process a code block and return the result.
    ///
    /// # Arguments
    ///
    /// * `language` - Language identifier from the fence info string
    /// * `attrs` - Attributes parsed from the fence (`key=value` pairs)
    /// * `source` - Raw content of the code block
    /// * `index` - Zero-based index of the code block in the document
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Warnings generated during processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Parse fence info string into language and attributes.
///
/// Format: `language [key=value ...]`
#[must_use]
pub(crate) fn parse_fence_info(info: &str) -> (String, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let attrs = parts
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| {
            let value = value.trim_matches('"').trim_matches('\'');
            (key.to_owned(), value.to_owned())
        })
        .collect();

    (language, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fence_info_language_only() {
        let (lang, attrs) = parse_fence_info("rust");
        assert_eq!(lang, "rust");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_with_attrs() {
        let (lang, attrs) = parse_fence_info("mermaid theme=dark scale='2'");
        assert_eq!(lang, "mermaid");
        assert_eq!(attrs.get("theme"), Some(&"dark".to_owned()));
        assert_eq!(attrs.get("scale"), Some(&"2".to_owned()));
    }

    #[test]
    fn test_parse_fence_info_ignores_bare_words() {
        let (lang, attrs) = parse_fence_info("python linenums");
        assert_eq!(lang, "python");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_whitespace_only() {
        let (lang, attrs) = parse_fence_info("   ");
        assert_eq!(lang, "");
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_default_warnings_empty() {
        struct Minimal;

        impl CodeBlockProcessor for Minimal {
            fn process(
                &mut self,
                _language: &str,
                _attrs: &HashMap<String, String>,
                _source: &str,
                _index: usize,
            ) -> ProcessResult {
                ProcessResult::PassThrough
            }
        }

        assert!(Minimal.warnings().is_empty());
    }
}
