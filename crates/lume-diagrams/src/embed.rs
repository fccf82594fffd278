//! HTML embedding for rendered diagrams.
//!
//! This module handles embedding rendered diagrams into HTML:
//! - root `<svg>` normalization so a diagram never overflows or floats
//! - error figures for failed renders
//! - swapping placeholder elements for their final markup

use std::sync::LazyLock;

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use lume_renderer::escape_html;
use regex::Regex;

use crate::consts::{ID_ATTR, PLACEHOLDER_CLASS};
use crate::engine::EngineError;

/// Opening tag of the first `<svg>` element.
static SVG_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg\b[^>]*>").unwrap());

/// One `name="value"` (or single-quoted) attribute.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*("[^"]*"|'[^']*')"#).unwrap()
});

/// Plain pixel length (`120`, `120.5`, `120px`).
static PIXELS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(?:px)?\s*$").unwrap());

/// What to put where a placeholder element was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    /// Leave the placeholder (and its source text) as is.
    Keep,
    /// Replace the whole element with this HTML.
    Replace(String),
    /// Remove the element.
    Remove,
}

/// Normalize a rendered SVG for inline display and wrap it in a figure.
///
/// The root element loses its `width`, `height` and `style` attributes and
/// gets a centered block style with `max-width` capped at `max_width` pixels.
/// A `viewBox` is synthesized from the old width/height when missing so the
/// drawing keeps its aspect ratio. Anything before the root (XML prolog,
/// doctype) is dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn constrain_svg(svg: &str, max_width: u32) -> Result<String, EngineError> {
    let open = SVG_OPEN_RE
        .find(svg)
        .ok_or_else(|| EngineError::InvalidOutput("no <svg> root element".to_owned()))?;
    let tag = open.as_str();
    let self_closing = tag.ends_with("/>");

    let rest = &svg[open.end()..];
    let body = if self_closing {
        ""
    } else {
        let close = rest
            .rfind("</svg>")
            .ok_or_else(|| EngineError::InvalidOutput("unterminated <svg> element".to_owned()))?;
        &rest[..close + "</svg>".len()]
    };

    let mut kept = String::new();
    let mut width = None;
    let mut height = None;
    let mut view_box = None;
    for caps in ATTR_RE.captures_iter(&tag[4..]) {
        let name = &caps[1];
        let quoted = &caps[2];
        let value = &quoted[1..quoted.len() - 1];
        match name.to_ascii_lowercase().as_str() {
            "width" => width = parse_pixels(value),
            "height" => height = parse_pixels(value),
            "style" => {}
            "viewbox" => {
                view_box = Some(value.to_owned());
                kept.push(' ');
                kept.push_str(&caps[0][1..]);
            }
            _ => {
                kept.push(' ');
                kept.push_str(&caps[0][1..]);
            }
        }
    }

    if view_box.is_none()
        && let (Some(w), Some(h)) = (width, height)
    {
        kept.push_str(&format!(r#" viewBox="0 0 {} {}""#, fmt_px(w), fmt_px(h)));
    }

    let natural = width.or_else(|| view_box.as_deref().and_then(view_box_width));
    let cap = f64::from(max_width);
    let shown = natural.map_or(cap, |w| w.min(cap)).round().max(1.0) as u32;

    let style = format!(
        "display:block;margin:0 auto;max-width:{shown}px;width:100%;height:auto;\
         position:static;float:none;z-index:auto"
    );
    let close = if self_closing { "/>" } else { ">" };

    Ok(format!(
        r#"<figure class="diagram"><svg{kept} style="{style}"{close}{body}</figure>"#
    ))
}

fn parse_pixels(value: &str) -> Option<f64> {
    PIXELS_RE
        .captures(value)
        .and_then(|caps| caps[1].parse().ok())
        .filter(|v: &f64| *v > 0.0)
}

fn view_box_width(view_box: &str) -> Option<f64> {
    view_box
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .nth(2)
        .and_then(|w| w.parse().ok())
        .filter(|v: &f64| *v > 0.0)
}

fn fmt_px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Figure shown in place of a diagram that failed to render.
#[must_use]
pub fn error_figure(message: &str) -> String {
    format!(
        r#"<figure class="diagram diagram-error"><pre>Diagram rendering failed: {}</pre></figure>"#,
        escape_html(message)
    )
}

/// Replace placeholder elements according to `fill`.
///
/// `fill` receives each placeholder's id. Placeholders without an id are
/// kept. On rewrite failure the markup is returned unchanged.
pub fn fill_placeholders(markup: &str, fill: impl Fn(&str) -> Fill) -> String {
    let selector = format!("div.{PLACEHOLDER_CLASS}[{ID_ATTR}]");
    let result = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!(selector, |el| {
                let Some(id) = el.get_attribute(ID_ATTR) else {
                    return Ok(());
                };
                match fill(&id) {
                    Fill::Keep => {}
                    Fill::Replace(html) => el.replace(&html, ContentType::Html),
                    Fill::Remove => el.remove(),
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    );

    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to inline diagrams");
        markup.to_owned()
    })
}
