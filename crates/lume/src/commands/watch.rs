//! `lume watch` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use futures::StreamExt;
use lume_diagrams::Theme;
use lume_preview::{DiagramEvent, DiagramStream, LiveDocument, Preview, PreviewOptions};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::{PassSummary, PipelineArgs, write_view};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output file, rewritten after every render.
    #[arg(short, long)]
    pub output: PathBuf,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Renders once, then again on every change to the input file. A new
    /// render supersedes the diagram pass of the previous one. Runs until
    /// interrupted.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the first render fails or the
    /// file watcher cannot be started.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = self.pipeline.load_config()?;
        let theme = config.diagrams.theme;
        let preview = Preview::new(PreviewOptions::from(&config));
        let mut live = preview.live_document();

        let target = self.pipeline.file.canonicalize().map_err(|e| {
            CliError::Validation(format!(
                "Failed to resolve {}: {e}",
                self.pipeline.file.display()
            ))
        })?;
        let watch_dir = target
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let (tx, mut rx) = mpsc::channel::<Event>(100);
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Use blocking_send since callback is sync
                let _ = tx.blocking_send(event);
            }
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        output.info(&format!("Watching {}", target.display()));
        output.info(&format!("Writing to {}", self.output.display()));

        let mut pass = self.render_view(&preview, &mut live, theme)?;
        let mut summary = PassSummary::default();

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    output.info("Stopped watching");
                    return Ok(());
                }
                received = rx.recv() => {
                    let Some(event) = received else {
                        return Err(CliError::Validation("File watcher stopped".to_owned()));
                    };
                    if is_change_to(&event, &target) {
                        match self.render_view(&preview, &mut live, theme) {
                            Ok(next) => {
                                pass = next;
                                summary = PassSummary::default();
                            }
                            Err(e) => output.warning(&e.to_string()),
                        }
                    }
                }
                next = next_event(&mut pass) => match next {
                    Some(event) => {
                        if live.apply(&event) {
                            summary.record(&event);
                        }
                    }
                    None => {
                        pass = None;
                        if summary.total() > 0 {
                            write_view(Some(&self.output), &live.to_html())?;
                            summary.report(output);
                        }
                    }
                },
            }
        }
    }

    /// Render the input, show and write the view, and start its diagram pass.
    fn render_view(
        &self,
        preview: &Preview,
        live: &mut LiveDocument,
        theme: Theme,
    ) -> Result<Option<DiagramStream>, CliError> {
        let source = self.pipeline.read_source()?;
        let doc = preview.render(&source);
        live.show(doc.clone());
        write_view(Some(&self.output), &live.to_html())?;

        tracing::info!(
            generation = doc.generation,
            diagrams = doc.placeholders.len(),
            "Rendered document"
        );

        if self.pipeline.no_diagrams || doc.pending().next().is_none() {
            return Ok(None);
        }
        Ok(Some(preview.fill_diagrams(&doc, theme)))
    }
}

/// Next result of the running diagram pass; never resolves when idle.
async fn next_event(pass: &mut Option<DiagramStream>) -> Option<DiagramEvent> {
    match pass {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Whether `event` creates or modifies the file at `target`.
fn is_change_to(event: &Event, target: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == target.file_name())
}
