//! Source preparation shared by the Mermaid engines.

use super::DiagramRequest;

/// Source as handed to a Mermaid renderer.
///
/// Mermaid-family sources get the theme and SVG text labels (no
/// `foreignObject` HTML) as an init directive unless they carry their own;
/// `flowchart`/`diagram` fences get a `graph TD` header when they have none.
/// Other languages pass through unchanged.
pub(crate) fn prepare_source(request: &DiagramRequest) -> String {
    if !request.language.is_mermaid_family() {
        return request.source.clone();
    }

    let mut source = String::with_capacity(request.source.len() + 96);
    if !request.source.contains("%%{init") {
        source.push_str(&format!(
            "%%{{init: {{\"theme\": \"{}\", \"htmlLabels\": false, \"flowchart\": {{\"htmlLabels\": false}}}}}}%%\n",
            request.theme.mermaid_theme()
        ));
    }
    if request.language.implies_flowchart() && !has_flowchart_header(&request.source) {
        source.push_str("graph TD\n");
    }
    source.push_str(&request.source);
    source
}

/// Number of lines [`prepare_source`] put in front of the original source.
pub(crate) fn added_lines(prepared: &str, original: &str) -> usize {
    prepared
        .len()
        .checked_sub(original.len())
        .map_or(0, |prefix| prepared[..prefix].matches('\n').count())
}

fn has_flowchart_header(source: &str) -> bool {
    source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))
        .and_then(|line| line.split_whitespace().next())
        .is_some_and(|word| word.eq_ignore_ascii_case("graph") || word.eq_ignore_ascii_case("flowchart"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::language::DiagramLanguage;
    use crate::theme::Theme;

    const DARK_INIT: &str =
        "%%{init: {\"theme\": \"dark\", \"htmlLabels\": false, \"flowchart\": {\"htmlLabels\": false}}}%%\n";

    #[test]
    fn test_prepare_mermaid_injects_theme() {
        let request = DiagramRequest::new(DiagramLanguage::Mermaid, "graph TD\nA-->B", Theme::Dark);
        assert_eq!(prepare_source(&request), format!("{DARK_INIT}graph TD\nA-->B"));
    }

    #[test]
    fn test_prepare_keeps_existing_init() {
        let source = "%%{init: {\"theme\": \"forest\"}}%%\ngraph LR\nA-->B";
        let request = DiagramRequest::new(DiagramLanguage::Mermaid, source, Theme::Dark);
        assert_eq!(prepare_source(&request), source);
    }

    #[test]
    fn test_prepare_diagram_adds_header() {
        let request = DiagramRequest::new(DiagramLanguage::Diagram, "A-->B", Theme::Light);
        assert_eq!(
            prepare_source(&request),
            "%%{init: {\"theme\": \"default\", \"htmlLabels\": false, \"flowchart\": {\"htmlLabels\": false}}}%%\ngraph TD\nA-->B"
        );
    }

    #[test]
    fn test_prepare_flowchart_with_header() {
        let request =
            DiagramRequest::new(DiagramLanguage::Flowchart, "flowchart LR\nA-->B", Theme::Light);
        assert!(prepare_source(&request).ends_with("\nflowchart LR\nA-->B"));
        assert!(!prepare_source(&request).contains("graph TD"));
    }

    #[test]
    fn test_prepare_other_languages_untouched() {
        let source = "@startuml\nA -> B\n@enduml";
        let request = DiagramRequest::new(DiagramLanguage::PlantUml, source, Theme::Dark);
        assert_eq!(prepare_source(&request), source);
    }

    #[test]
    fn test_added_lines() {
        let request = DiagramRequest::new(DiagramLanguage::Diagram, "A-->B\nB-->C", Theme::Dark);
        assert_eq!(added_lines(&prepare_source(&request), &request.source), 2);

        let request = DiagramRequest::new(DiagramLanguage::PlantUml, "A -> B", Theme::Dark);
        assert_eq!(added_lines(&prepare_source(&request), &request.source), 0);
    }
}
