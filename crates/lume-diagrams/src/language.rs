//! Diagram languages recognized in fenced code blocks.

/// Supported diagram languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramLanguage {
    /// Mermaid notation (any diagram kind).
    Mermaid,
    /// Mermaid flowchart, header optional (`flowchart`, `flow`).
    Flowchart,
    /// Generic `diagram` fence, rendered as a flowchart.
    Diagram,
    PlantUml,
    GraphViz,
    D2,
    Svgbob,
}

impl DiagramLanguage {
    /// Parse language from code fence info string.
    ///
    /// Supports both direct language names (`mermaid`) and `kroki-` prefixed
    /// names (`kroki-mermaid`). Returns `None` for ordinary code.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        let lang = lower.strip_prefix("kroki-").unwrap_or(&lower);

        match lang {
            "mermaid" => Some(Self::Mermaid),
            "flowchart" | "flow" => Some(Self::Flowchart),
            "diagram" => Some(Self::Diagram),
            "plantuml" | "puml" => Some(Self::PlantUml),
            "graphviz" | "dot" => Some(Self::GraphViz),
            "d2" => Some(Self::D2),
            "svgbob" => Some(Self::Svgbob),
            _ => None,
        }
    }

    /// Canonical name, written to the placeholder's language attribute.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Flowchart => "flowchart",
            Self::Diagram => "diagram",
            Self::PlantUml => "plantuml",
            Self::GraphViz => "graphviz",
            Self::D2 => "d2",
            Self::Svgbob => "svgbob",
        }
    }

    /// Kroki endpoint name for this diagram type.
    #[must_use]
    pub fn kroki_endpoint(self) -> &'static str {
        match self {
            Self::Mermaid | Self::Flowchart | Self::Diagram => "mermaid",
            Self::PlantUml => "plantuml",
            Self::GraphViz => "graphviz",
            Self::D2 => "d2",
            Self::Svgbob => "svgbob",
        }
    }

    /// Whether the source is (a subset of) Mermaid and accepts `%%{init}%%`.
    #[must_use]
    pub fn is_mermaid_family(self) -> bool {
        matches!(self, Self::Mermaid | Self::Flowchart | Self::Diagram)
    }

    /// Whether the source may omit the `graph`/`flowchart` header line.
    #[must_use]
    pub fn implies_flowchart(self) -> bool {
        matches!(self, Self::Flowchart | Self::Diagram)
    }
}
