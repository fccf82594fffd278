//! Streaming rewrite of untrusted markup.

use std::borrow::Cow;

use lol_html::html_content::{ContentType, Element, TextChunk};
use lol_html::{RewriteStrSettings, doc_comments, element, rewrite_str, text};

use crate::allowlist::{is_allowed_attr, is_allowed_tag, is_dropped_with_content, is_url_attr};
use crate::value::{has_script_scheme, is_safe_style, is_safe_stylesheet, is_safe_url};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Allow-list HTML sanitizer.
///
/// Removes everything that can execute script and keeps document structure,
/// MathML and SVG. [`sanitize`](Self::sanitize) never fails: if the input
/// cannot be rewritten it comes back fully escaped.
///
/// The default profile drops every `<style>` element. The
/// [diagram profile](Self::for_diagrams) keeps `<style>` inside SVG when its
/// stylesheet loads nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sanitizer {
    keep_stylesheets: bool,
}

impl Sanitizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile for engine-produced SVG, which styles itself with an
    /// embedded stylesheet.
    #[must_use]
    pub fn for_diagrams() -> Self {
        Self {
            keep_stylesheets: true,
        }
    }

    /// Sanitize a fragment of HTML.
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> String {
        if !raw.contains('<') {
            return raw.to_owned();
        }

        let keep_stylesheets = self.keep_stylesheets;
        let mut stylesheet = String::new();
        let mut element_content_handlers = vec![element!("*", |el| {
            clean_element(el, keep_stylesheets);
            Ok(())
        })];
        if keep_stylesheets {
            element_content_handlers.push(text!("style", |chunk| {
                filter_stylesheet(chunk, &mut stylesheet);
                Ok(())
            }));
        }

        let text = escape_stray_lt(raw);
        let result = rewrite_str(
            &text,
            RewriteStrSettings {
                element_content_handlers,
                document_content_handlers: vec![doc_comments!(|c| {
                    c.remove();
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        );

        match result {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(error = %e, "HTML rewrite failed, escaping input");
                escape_all(raw)
            }
        }
    }
}

fn clean_element(el: &mut Element<'_, '_>, keep_stylesheets: bool) {
    let tag = el.tag_name().to_ascii_lowercase();
    let in_svg = el.namespace_uri() == SVG_NAMESPACE;

    if tag == "style" && keep_stylesheets && in_svg {
        let names: Vec<String> = el.attributes().iter().map(|a| a.name()).collect();
        for name in names {
            el.remove_attribute(&name);
        }
        return;
    }
    // The document title is raw text; only the SVG tooltip element is kept.
    if is_dropped_with_content(&tag) || (tag == "title" && !in_svg) {
        el.remove();
        return;
    }
    if !is_allowed_tag(&tag) {
        el.remove_and_keep_content();
        return;
    }
    if tag == "input"
        && !el
            .get_attribute("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
    {
        el.remove();
        return;
    }

    let attrs: Vec<(String, String)> = el
        .attributes()
        .iter()
        .map(|a| (a.name(), a.value()))
        .collect();

    for (name, value) in attrs {
        let lc_name = name.to_ascii_lowercase();
        if !is_allowed_value(&tag, &lc_name, &value) {
            el.remove_attribute(&name);
        }
    }

    if tag == "a"
        && el
            .get_attribute("target")
            .is_some_and(|t| t.eq_ignore_ascii_case("_blank"))
    {
        let _ = el.set_attribute("rel", "noopener noreferrer");
    }
}

/// Buffer a stylesheet across chunks and emit it whole, or not at all.
fn filter_stylesheet(chunk: &mut TextChunk<'_>, buffer: &mut String) {
    buffer.push_str(chunk.as_str());
    if !chunk.last_in_text_node() {
        chunk.remove();
        return;
    }

    let css = std::mem::take(buffer);
    if is_safe_stylesheet(&css) {
        chunk.replace(&css, ContentType::Html);
    } else {
        tracing::debug!(len = css.len(), "Dropped unsafe stylesheet");
        chunk.remove();
    }
}

fn is_allowed_value(tag: &str, name: &str, value: &str) -> bool {
    if !is_allowed_attr(name) || has_script_scheme(value) {
        return false;
    }
    if is_url_attr(name) {
        return is_safe_url(tag, name, value);
    }
    if name == "style" {
        return is_safe_style(value);
    }
    true
}

/// Escape `<` that cannot open a tag, a comment or a declaration.
///
/// Browsers treat `a < b` as text; the rewriter is stricter.
fn escape_stray_lt(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let is_stray = |i: usize| {
        bytes[i] == b'<'
            && !bytes
                .get(i + 1)
                .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, b'/' | b'!' | b'?'))
    };

    if !(0..bytes.len()).any(is_stray) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 8);
    let mut last = 0;
    for i in (0..bytes.len()).filter(|&i| is_stray(i)) {
        out.push_str(&input[last..i]);
        out.push_str("&lt;");
        last = i + 1;
    }
    out.push_str(&input[last..]);
    Cow::Owned(out)
}

fn escape_all(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
