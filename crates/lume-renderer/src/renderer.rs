//! Generic markdown renderer with pluggable backend.

use std::collections::HashMap;
use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::backend::RenderBackend;
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::state::{
    CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html, slugify,
};

/// Fence language rendered as display math.
const MATH_FENCE: &str = "math";

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML content (unsanitized).
    pub html: String,
    /// Document outline in heading order.
    pub toc: Vec<TocEntry>,
    /// Warnings reported by code block processors.
    pub warnings: Vec<String>,
}

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait to delegate format-specific rendering
/// while handling common elements (tables, lists, inline formatting) generically.
///
/// # Code Block Processors
///
/// Custom code block processing can be added via [`with_processor`](Self::with_processor).
/// Processors are checked in order; the first returning a non-`PassThrough` result wins.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_block_index: usize,
    pending_attrs: HashMap<String, String>,
    gfm: bool,
    math: bool,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a new renderer with GFM and math enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            processors: Vec::new(),
            code_block_index: 0,
            pending_attrs: HashMap::new(),
            gfm: true,
            math: true,
            _backend: PhantomData,
        }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Footnotes
    /// - Definition lists, superscript and subscript
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Enable or disable TeX math (`$…$`, `$$…$$` and `math` fences).
    #[must_use]
    pub fn with_math(mut self, enabled: bool) -> Self {
        self.math = enabled;
        self
    }

    /// Get parser options based on configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options |= Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_DEFINITION_LIST
                | Options::ENABLE_SUPERSCRIPT
                | Options::ENABLE_SUBSCRIPT;
        }
        if self.math {
            options |= Options::ENABLE_MATH;
        }
        options
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        self.render(self.create_parser(markdown))
    }

    /// Add a code block processor.
    ///
    /// Processors are checked in order when a fenced code block with a
    /// language is encountered. The first processor returning a
    /// non-`PassThrough` result wins.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use lume_renderer::{CodeBlockProcessor, HtmlBackend, MarkdownRenderer, ProcessResult};
    ///
    /// struct Upper;
    ///
    /// impl CodeBlockProcessor for Upper {
    ///     fn process(
    ///         &mut self,
    ///         language: &str,
    ///         _attrs: &HashMap<String, String>,
    ///         source: &str,
    ///         _index: usize,
    ///     ) -> ProcessResult {
    ///         if language == "shout" {
    ///             ProcessResult::Inline(format!("<p>{}</p>", source.trim().to_uppercase()))
    ///         } else {
    ///             ProcessResult::PassThrough
    ///         }
    ///     }
    /// }
    ///
    /// let result = MarkdownRenderer::<HtmlBackend>::new()
    ///     .with_processor(Upper)
    ///     .render_markdown("```shout\nhi\n```");
    /// assert_eq!(result.html, "<p>HI</p>");
    /// ```
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Get all warnings from all processors.
    pub fn processor_warnings(&self) -> impl Iterator<Item = String> + '_ {
        self.processors.iter().flat_map(|p| p.warnings()).cloned()
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Render markdown events and return the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        RenderResult {
            html: std::mem::take(&mut self.output),
            toc: self.heading.take_toc(),
            warnings: self.processor_warnings().collect(),
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.horizontal_rule(),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::InlineMath(tex) => self.inline_math(&tex),
            Event::DisplayMath(tex) => self.display_math(&tex),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start_heading(level);
            }
            Tag::BlockQuote(_) => B::blockquote_start(&mut self.output),
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(ref info) if !info.is_empty() => {
                        let (lang, attrs) = parse_fence_info(info);
                        (if lang.is_empty() { None } else { Some(lang) }, attrs)
                    }
                    _ => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(start) => {
                match start {
                    Some(1) => self.output.push_str("<ol>"),
                    Some(n) => {
                        let _ = write!(self.output, r#"<ol start="{n}">"#);
                    }
                    None => self.output.push_str("<ul>"),
                }
            }
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                let _ = write!(
                    self.output,
                    r#"<div class="footnote-definition" id="fn-{}"><sup class="footnote-label">{}</sup>"#,
                    slugify(&label),
                    escape_html(&label)
                );
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                let _ = write!(self.output, "<{tag}{align}>");
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let link_tag = if title.is_empty() {
                    format!(r#"<a href="{}">"#, escape_html(&dest_url))
                } else {
                    format!(
                        r#"<a href="{}" title="{}">"#,
                        escape_html(&dest_url),
                        escape_html(&title)
                    )
                };
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until End(Image).
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.code.is_active() {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_level) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    let _ = write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    );
                }
            }
            TagEnd::BlockQuote(_) => B::blockquote_end(&mut self.output),
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(ordered) => self
                .output
                .push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => self.output.push_str("</div>"),
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut img = String::new();
                    B::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
        }
    }

    fn finish_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);
        let index = self.code_block_index;
        self.code_block_index += 1;

        if self.math && lang.as_deref() == Some(MATH_FENCE) {
            B::display_math(&content, &mut self.output);
            return;
        }

        // Try processors in order, fall back to normal code block rendering
        let processed = lang.as_ref().is_some_and(|lang_str| {
            self.processors.iter_mut().any(|processor| {
                match processor.process(lang_str, &attrs, &content, index) {
                    ProcessResult::Inline(html) => {
                        self.output.push_str(&html);
                        true
                    }
                    ProcessResult::PassThrough => false,
                }
            })
        });

        if !processed {
            B::code_block(lang.as_deref(), &content, &mut self.output);
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }

    fn inline_math(&mut self, tex: &str) {
        if self.heading.is_active() {
            self.heading.push_text(tex);
        }
        let mut html = String::new();
        B::inline_math(tex, &mut html);
        self.push_inline(&html);
    }

    fn display_math(&mut self, tex: &str) {
        let mut html = String::new();
        B::display_math(tex, &mut html);
        self.push_inline(&html);
    }

    fn footnote_reference(&mut self, label: &str) {
        let mut html = String::new();
        B::footnote_reference(label, &mut html);
        self.push_inline(&html);
    }

    fn raw_html(&mut self, html: &str) {
        self.push_inline(html);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            self.push_inline("\n");
        }
    }

    fn hard_break(&mut self) {
        let mut html = String::new();
        B::hard_break(&mut html);
        self.push_inline(&html);
    }

    fn horizontal_rule(&mut self) {
        B::horizontal_rule(&mut self.output);
    }

    fn task_list_marker(&mut self, checked: bool) {
        B::task_list_marker(checked, &mut self.output);
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}
