//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod watch;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use futures::StreamExt;
use lume_config::{CliSettings, Config};
use lume_diagrams::{DiagramState, Theme};
use lume_preview::{DiagramEvent, LiveDocument, Preview, RenderedDocument};

use crate::error::CliError;
use crate::output::Output;

pub(crate) use render::RenderArgs;
pub(crate) use watch::WatchArgs;

/// Arguments shared by `render` and `watch`.
#[derive(Args)]
pub(crate) struct PipelineArgs {
    /// Markdown file to render.
    pub file: PathBuf,

    /// Path to configuration file (default: auto-discover lume.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Diagram theme (overrides config).
    #[arg(long)]
    theme: Option<Theme>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long)]
    kroki_url: Option<String>,

    /// Enable the render cache (default: enabled).
    #[arg(long)]
    cache: Option<bool>,

    /// Disable the render cache.
    #[arg(long, conflicts_with = "cache")]
    no_cache: bool,

    /// Leave diagram blocks as source text.
    #[arg(long)]
    pub no_diagrams: bool,

    /// Enable verbose output (show render and diagram logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl PipelineArgs {
    /// Load configuration with command-line overrides applied.
    pub(crate) fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            cache_enabled: self.resolve_cache_enabled(),
            kroki_url: self.kroki_url.clone(),
            theme: self.theme,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    pub(crate) fn read_source(&self) -> Result<String, CliError> {
        std::fs::read_to_string(&self.file).map_err(|e| {
            CliError::Validation(format!("Failed to read {}: {e}", self.file.display()))
        })
    }

    /// Resolve `cache_enabled` from --cache/--no-cache flags.
    fn resolve_cache_enabled(&self) -> Option<bool> {
        self.no_cache.then_some(false).or(self.cache)
    }
}

/// Write a view to `path`, or to stdout when no path is given.
pub(crate) fn write_view(path: Option<&Path>, html: &str) -> io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, html),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.write_all(b"\n")?;
            stdout.flush()
        }
    }
}

/// Outcome of one diagram pass.
#[derive(Debug, Default)]
pub(crate) struct PassSummary {
    rendered: usize,
    failures: Vec<String>,
}

impl PassSummary {
    pub(crate) fn record(&mut self, event: &DiagramEvent) {
        match event.state() {
            DiagramState::Rendered => self.rendered += 1,
            DiagramState::Failed => self.failures.push(
                event
                    .error_message()
                    .unwrap_or("unknown error")
                    .to_owned(),
            ),
            _ => {}
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.rendered + self.failures.len()
    }

    pub(crate) fn report(&self, output: &Output) {
        if self.total() == 0 {
            return;
        }
        if self.failures.is_empty() {
            output.info(&format!("Rendered {} diagram(s)", self.rendered));
            return;
        }
        output.warning(&format!(
            "{} of {} diagram(s) failed to render:",
            self.failures.len(),
            self.total()
        ));
        for message in &self.failures {
            output.detail(message);
        }
    }
}

/// Run the diagram pass of `doc` to completion, applying results to `live`.
pub(crate) async fn run_pass(
    preview: &Preview,
    live: &mut LiveDocument,
    doc: &RenderedDocument,
    theme: Theme,
) -> PassSummary {
    let mut summary = PassSummary::default();
    let mut events = preview.fill_diagrams(doc, theme);
    while let Some(event) = events.next().await {
        if live.apply(&event) {
            summary.record(&event);
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use lume_diagrams::DiagramPlaceholder;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        pipeline: PipelineArgs,
    }

    fn parse(args: &[&str]) -> PipelineArgs {
        TestCli::try_parse_from(std::iter::once("lume").chain(args.iter().copied()))
            .unwrap()
            .pipeline
    }

    fn event(state: DiagramState) -> DiagramEvent {
        let mut placeholder = DiagramPlaceholder::new("d", 0, "diagram", "A-->B");
        placeholder.start_rendering().unwrap();
        if state == DiagramState::Failed {
            placeholder
                .fail("line 1: unexpected end", String::new())
                .unwrap();
        } else {
            placeholder.complete("<figure></figure>".to_owned()).unwrap();
        }
        DiagramEvent::new(1, placeholder)
    }

    #[test]
    fn test_resolve_cache_enabled() {
        assert_eq!(parse(&["doc.md"]).resolve_cache_enabled(), None);
        assert_eq!(parse(&["doc.md", "--no-cache"]).resolve_cache_enabled(), Some(false));
        assert_eq!(
            parse(&["doc.md", "--cache", "false"]).resolve_cache_enabled(),
            Some(false)
        );
        assert_eq!(
            parse(&["doc.md", "--cache", "true"]).resolve_cache_enabled(),
            Some(true)
        );
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("lume.toml");
        std::fs::write(&config_path, "[diagrams]\ntheme = \"light\"\n").unwrap();

        let args = parse(&[
            "doc.md",
            "--config",
            config_path.to_str().unwrap(),
            "--theme",
            "dark",
            "--no-cache",
            "--kroki-url",
            "https://kroki.example.com",
        ]);
        let config = args.load_config().unwrap();
        assert_eq!(config.diagrams.theme, Theme::Dark);
        assert!(!config.cache.enabled);
        assert_eq!(
            config.diagrams.kroki_url.as_deref(),
            Some("https://kroki.example.com")
        );
    }

    #[test]
    fn test_load_config_rejects_bad_kroki_url() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("lume.toml");
        std::fs::write(&config_path, "").unwrap();

        let args = parse(&[
            "doc.md",
            "--config",
            config_path.to_str().unwrap(),
            "--kroki-url",
            "kroki.example.com",
        ]);
        assert!(matches!(args.load_config(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_read_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.md");
        let args = parse(&[missing.to_str().unwrap()]);

        let err = args.read_source().unwrap_err();
        assert!(err.to_string().starts_with("Failed to read "));
    }

    #[test]
    fn test_write_view_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        write_view(Some(&path), "<p>hi</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn test_pass_summary() {
        let mut summary = PassSummary::default();
        assert_eq!(summary.total(), 0);

        summary.record(&event(DiagramState::Rendered));
        summary.record(&event(DiagramState::Failed));
        summary.record(&event(DiagramState::Rendered));

        assert_eq!(summary.rendered, 2);
        assert_eq!(summary.failures, vec!["line 1: unexpected end".to_owned()]);
        assert_eq!(summary.total(), 3);
    }
}
