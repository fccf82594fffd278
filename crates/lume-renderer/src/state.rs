//! Context tracked while walking the markdown event stream.

use std::collections::HashMap;

use pulldown_cmark::{Alignment, HeadingLevel};

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Alignment style attribute for the current cell.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Collects image alt text between `Start(Image)` and `End(Image)`.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    pub fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Document outline entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text without markup.
    pub title: String,
    /// Anchor ID of the rendered heading.
    pub id: String,
}

/// Heading capture and unique anchor generation.
#[derive(Default)]
pub(crate) struct HeadingState {
    /// Level of the heading being captured (None outside headings).
    current_level: Option<u8>,
    /// Plain text for the outline and slug.
    text: String,
    /// Inline HTML of the heading body.
    html: String,
    toc: Vec<TocEntry>,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub fn start_heading(&mut self, level: HeadingLevel) {
        self.current_level = Some(heading_level_to_num(level));
        self.text.clear();
        self.html.clear();
    }

    /// Finish the heading and record it in the outline.
    ///
    /// Returns `(level, id, html)` or `None` when no heading is open.
    pub fn complete_heading(&mut self) -> Option<(u8, String, String)> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.generate_id(&text);

        self.toc.push(TocEntry {
            level,
            title: text.trim().to_owned(),
            id: id.clone(),
        });

        Some((level, id, html))
    }

    fn generate_id(&mut self, text: &str) -> String {
        let mut base_id = slugify(text);
        if base_id.is_empty() {
            "section".clone_into(&mut base_id);
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Convert text to URL-safe slug.
///
/// Lowercases ASCII alphanumerics, collapses whitespace, dashes and underscores
/// into single dashes, and drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
