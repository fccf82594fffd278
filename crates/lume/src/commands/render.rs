//! `lume render` command implementation.

use std::path::PathBuf;

use clap::Args;
use lume_preview::{Preview, PreviewOptions};

use super::{PassSummary, PipelineArgs, run_pass, write_view};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the input cannot be read or
    /// the output cannot be written. Diagram failures are reported, not
    /// returned.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let html = self.render_html(output).await?;
        write_view(self.output.as_deref(), &html)?;

        if let Some(path) = &self.output {
            output.success(&format!("Wrote {}", path.display()));
        }
        Ok(())
    }

    async fn render_html(&self, output: &Output) -> Result<String, CliError> {
        let config = self.pipeline.load_config()?;
        let source = self.pipeline.read_source()?;

        let preview = Preview::new(PreviewOptions::from(&config));
        let mut live = preview.live_document();
        let doc = preview.render(&source);
        live.show(doc.clone());

        let summary = if self.pipeline.no_diagrams {
            PassSummary::default()
        } else {
            run_pass(&preview, &mut live, &doc, config.diagrams.theme).await
        };
        summary.report(output);

        Ok(live.to_html())
    }
}
