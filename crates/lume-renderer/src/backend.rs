//! Render backend trait for format-specific output.
//!
//! The generic renderer walks the event stream and handles nesting (lists,
//! tables, inline formatting). Elements whose markup is a policy decision are
//! delegated to the backend.

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Render a fenced or indented code block.
    ///
    /// `lang` is the first word of the fence info string, if any. It must be
    /// preserved in the output so that syntax highlighting can run later.
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Render an image with collected alt text.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Render inline math (`$x^2$`).
    ///
    /// The TeX source is kept verbatim (escaped) for a client-side typesetter.
    fn inline_math(tex: &str, out: &mut String);

    /// Render display math (`$$…$$` or a `math` fence).
    fn display_math(tex: &str, out: &mut String);

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }

    /// Render a footnote reference.
    fn footnote_reference(label: &str, out: &mut String);
}
