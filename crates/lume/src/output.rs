//! Colored terminal output utilities.

use console::{Style, Term};

/// Terminal output formatter.
///
/// Writes to stderr so that rendered HTML can go to stdout.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.term.write_line(&self.yellow.apply_to(msg).to_string());
    }

    /// Print an indented detail line (dimmed).
    pub(crate) fn detail(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&format!("  {}", self.dim.apply_to(msg)));
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }
}
