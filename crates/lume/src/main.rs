//! Lume CLI - live markdown preview.
//!
//! Provides commands for:
//! - `render`: Render a markdown file, diagrams included, to an HTML fragment
//! - `watch`: Re-render a markdown file whenever it changes

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, WatchArgs};
use error::CliError;
use output::Output;

/// Lume - live markdown preview.
#[derive(Parser)]
#[command(name = "lume", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file once.
    Render(RenderArgs),
    /// Re-render a markdown file on every change.
    Watch(WatchArgs),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Render(args) => args.pipeline.verbose,
            Self::Watch(args) => args.pipeline.verbose,
        }
    }

    async fn execute(self, output: &Output) -> Result<(), CliError> {
        match self {
            Self::Render(args) => args.execute(output).await,
            Self::Watch(args) => args.execute(output).await,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(CliError::from)
        .and_then(|rt| rt.block_on(cli.command.execute(&output)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "lume", "render", "doc.md", "--theme", "dark", "-o", "out.html", "-v",
        ])
        .unwrap();
        let Commands::Render(args) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(args.pipeline.file, PathBuf::from("doc.md"));
        assert_eq!(args.output, Some(PathBuf::from("out.html")));
        assert!(args.pipeline.verbose);
    }

    #[test]
    fn test_watch_requires_output() {
        assert!(Cli::try_parse_from(["lume", "watch", "doc.md"]).is_err());
        assert!(Cli::try_parse_from(["lume", "watch", "doc.md", "-o", "out.html"]).is_ok());
    }

    #[test]
    fn test_unknown_theme_rejected() {
        assert!(Cli::try_parse_from(["lume", "render", "doc.md", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn test_cache_flags_conflict() {
        assert!(
            Cli::try_parse_from(["lume", "render", "doc.md", "--cache", "true", "--no-cache"])
                .is_err()
        );
    }
}
