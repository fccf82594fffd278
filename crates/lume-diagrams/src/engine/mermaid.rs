//! In-process Mermaid engine.
//!
//! Parses, lays out and draws Mermaid sources with `merman`, a headless
//! Mermaid implementation, so previews need no browser and no network.
//! Sources go through the same preparation as the Kroki engine: theme and
//! SVG-text labels as an init directive, `graph TD` for headerless
//! flowcharts.

use std::sync::LazyLock;

use merman::render::{HeadlessError, HeadlessRenderer};
use regex::Regex;

use super::source::{added_lines, prepare_source};
use super::{DiagramEngine, DiagramRequest, EngineError};
use crate::cache::DiagramKey;

/// `line 3` in parser messages.
static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bline (\d+)").expect("valid regex"));

/// Length of the per-diagram SVG id suffix.
const ID_HASH_LEN: usize = 12;

/// Renders the Mermaid family without any external service.
#[derive(Clone, Default)]
pub struct MermaidEngine {
    renderer: HeadlessRenderer,
}

impl MermaidEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagramEngine for MermaidEngine {
    fn render(&self, request: &DiagramRequest) -> Result<String, EngineError> {
        if !request.language.is_mermaid_family() {
            return Err(EngineError::Unsupported(format!(
                "{} diagrams need a Kroki server",
                request.language.as_str()
            )));
        }

        let source = prepare_source(request);
        let svg = self
            .renderer
            .render_svg_readable_sync_with_diagram_id(&source, &diagram_id(request))
            .map_err(|e| engine_error(&e, added_lines(&source, &request.source)))?;

        svg.ok_or_else(|| EngineError::Unsupported("no Mermaid diagram found".to_owned()))
    }

    fn name(&self) -> &'static str {
        "mermaid"
    }
}

/// SVG root id, unique per diagram so inlined stylesheets and markers of
/// several diagrams never clash.
fn diagram_id(request: &DiagramRequest) -> String {
    let hash = DiagramKey {
        source: &request.source,
        language: request.language.as_str(),
        theme: request.theme,
    }
    .compute_hash();
    format!("lume-{}", &hash[..ID_HASH_LEN])
}

/// Map a `merman` error, moving reported lines back to the user's source.
fn engine_error(error: &HeadlessError, added: usize) -> EngineError {
    match error {
        HeadlessError::Parse(
            merman::Error::UnsupportedDiagram { .. } | merman::Error::DetectType(_),
        ) => EngineError::Unsupported(error.to_string()),
        HeadlessError::Parse(e) => {
            let message = e.to_string();
            let line = LINE_RE
                .captures(&message)
                .and_then(|caps| caps[1].parse::<usize>().ok())
                .map_or(1, |line| line.saturating_sub(added).max(1));
            EngineError::Syntax { line, message }
        }
        HeadlessError::Render(e) => EngineError::InvalidOutput(e.to_string()),
    }
}
