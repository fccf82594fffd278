//! HTML backend for markdown rendering.

use std::fmt::Write;

use crate::backend::RenderBackend;
use crate::state::{escape_html, slugify};

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<pre><code class="language-…">` for code blocks
/// - `<span class="math math-inline">` / `<div class="math math-display">` for TeX
/// - `<sup class="footnote-ref">` links for footnote references
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            let _ = write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            );
        } else {
            let _ = write!(out, "<pre><code>{}</code></pre>", escape_html(content));
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        let _ = write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        );
    }

    fn inline_math(tex: &str, out: &mut String) {
        let _ = write!(
            out,
            r#"<span class="math math-inline">{}</span>"#,
            escape_html(tex)
        );
    }

    fn display_math(tex: &str, out: &mut String) {
        let _ = write!(
            out,
            r#"<div class="math math-display">{}</div>"#,
            escape_html(tex.trim())
        );
    }

    fn footnote_reference(label: &str, out: &mut String) {
        let id = slugify(label);
        let _ = write!(
            out,
            r##"<sup class="footnote-ref"><a href="#fn-{id}">{}</a></sup>"##,
            escape_html(label)
        );
    }
}
