//! Tag and attribute allow-lists.
//!
//! Names are compared in ASCII lowercase, so SVG's camel-cased names
//! (`viewBox`, `markerWidth`) appear here lowercased.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Elements removed together with everything inside them.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "applet", "base", "button", "embed", "form", "frame", "frameset", "iframe", "link", "meta",
    "noembed", "noframes", "noscript", "object", "plaintext", "script", "select", "style",
    "template", "textarea", "xmp",
];

const DOCUMENT_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "b", "bdi", "bdo", "blockquote", "br", "caption", "cite",
    "code", "col", "colgroup", "dd", "del", "details", "dfn", "div", "dl", "dt", "em",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i",
    "img", "input", "ins", "kbd", "li", "main", "mark", "nav", "ol", "p", "pre", "q", "rp", "rt",
    "ruby", "s", "samp", "section", "small", "span", "strike", "strong", "sub", "summary", "sup",
    "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "u", "ul", "var", "wbr",
];

const MATHML_TAGS: &[&str] = &[
    "annotation", "math", "menclose", "merror", "mfrac", "mi", "mmultiscripts", "mn", "mo",
    "mover", "mpadded", "mphantom", "mprescripts", "mroot", "mrow", "ms", "mspace", "msqrt",
    "mstyle", "msub", "msubsup", "msup", "mtable", "mtd", "mtext", "mtr", "munder",
    "munderover", "none", "semantics",
];

const SVG_TAGS: &[&str] = &[
    "circle", "clippath", "defs", "desc", "ellipse", "g", "line", "lineargradient", "marker",
    "mask", "path", "pattern", "polygon", "polyline", "radialgradient", "rect", "stop", "svg",
    "switch", "symbol", "text", "textpath", "title", "tspan",
];

const GLOBAL_ATTRS: &[&str] = &["class", "dir", "id", "lang", "role", "style", "title"];

const NAVIGATION_ATTRS: &[&str] = &["href", "rel", "target", "xlink:href"];

const ELEMENT_ATTRS: &[&str] = &[
    // tables and lists
    "align", "colspan", "headers", "reversed", "rowspan", "scope", "span", "start", "type",
    "valign",
    // media and misc
    "alt", "checked", "cite", "datetime", "disabled", "height", "loading", "open", "src",
    "width",
    // mathml
    "columnalign", "display", "displaystyle", "encoding", "fence", "lspace", "mathsize",
    "mathvariant", "rspace", "scriptlevel", "separator", "stretchy",
];

const SVG_ATTRS: &[&str] = &[
    "alignment-baseline", "clip-path", "clip-rule", "clippathunits", "cx", "cy", "d",
    "dominant-baseline", "dx", "dy", "fill", "fill-opacity", "fill-rule", "font-family",
    "font-size", "font-style", "font-weight", "fx", "fy", "gradienttransform", "gradientunits",
    "marker-end", "marker-mid", "marker-start", "markerheight", "markerunits", "markerwidth",
    "mask", "offset", "opacity", "orient", "patternunits", "points", "preserveaspectratio", "r",
    "refx", "refy", "rx", "ry", "stop-color", "stop-opacity", "stroke", "stroke-dasharray",
    "stroke-dashoffset", "stroke-linecap", "stroke-linejoin", "stroke-miterlimit",
    "stroke-opacity", "stroke-width", "text-anchor", "text-decoration", "transform", "version",
    "viewbox", "visibility", "x", "x1", "x2", "xml:space", "xmlns", "xmlns:xlink", "y", "y1",
    "y2",
];

/// Attributes whose value is a URL.
const URL_ATTRS: &[&str] = &["cite", "href", "src", "xlink:href"];

static DROPPED: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| DROPPED_WITH_CONTENT.iter().copied().collect());

static TAGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    DOCUMENT_TAGS
        .iter()
        .chain(MATHML_TAGS)
        .chain(SVG_TAGS)
        .copied()
        .collect()
});

static ATTRS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    GLOBAL_ATTRS
        .iter()
        .chain(NAVIGATION_ATTRS)
        .chain(ELEMENT_ATTRS)
        .chain(SVG_ATTRS)
        .copied()
        .collect()
});

/// Whether the element and its content must be removed.
pub(crate) fn is_dropped_with_content(tag: &str) -> bool {
    DROPPED.contains(tag)
}

/// Whether the element may stay.
pub(crate) fn is_allowed_tag(tag: &str) -> bool {
    TAGS.contains(tag)
}

/// Whether the attribute name may stay (value checks are separate).
pub(crate) fn is_allowed_attr(name: &str) -> bool {
    if let Some(rest) = name
        .strip_prefix("data-")
        .or_else(|| name.strip_prefix("aria-"))
    {
        return !rest.is_empty()
            && rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    }
    ATTRS.contains(name)
}

pub(crate) fn is_url_attr(name: &str) -> bool {
    URL_ATTRS.contains(&name)
}
