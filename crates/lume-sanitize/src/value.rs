//! Attribute value checks.

use std::sync::LazyLock;

use regex::Regex;

/// Whitespace and control characters browsers ignore inside URL schemes.
static IGNORED_IN_SCHEME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{0000}-\u{0020}\u{007F}\u{00A0}\u{1680}\u{180E}\u{2000}-\u{2029}\u{205F}\u{3000}\u{FEFF}]")
        .expect("valid regex")
});

static CSS_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

/// Schemes allowed in URL attributes. Relative URLs carry no scheme.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "ftp"];

const SCRIPT_SCHEMES: &[&str] = &["javascript:", "vbscript:", "livescript:"];

/// Decode entities and drop characters that browsers skip, then lowercase.
///
/// `jav&#x09;ascript&colon;` and ` JAVASCRIPT:` both normalize to
/// `javascript:`.
fn normalize(value: &str) -> String {
    let decoded = htmlize::unescape(value);
    IGNORED_IN_SCHEME
        .replace_all(&decoded, "")
        .to_ascii_lowercase()
}

/// Whether the value smuggles a script URL, in any attribute.
pub(crate) fn has_script_scheme(value: &str) -> bool {
    let normalized = normalize(value);
    SCRIPT_SCHEMES
        .iter()
        .any(|scheme| normalized.contains(scheme))
}

/// Whether a URL attribute value may stay on the given element.
pub(crate) fn is_safe_url(tag: &str, attr: &str, value: &str) -> bool {
    let normalized = normalize(value);
    let Some(scheme) = url_scheme(&normalized) else {
        return true;
    };
    if scheme == "data" {
        return tag == "img" && attr == "src";
    }
    SAFE_SCHEMES.contains(&scheme)
}

/// Scheme of an absolute URL, or `None` for relative URLs.
fn url_scheme(url: &str) -> Option<&str> {
    let end = url.find([':', '/', '?', '#'])?;
    if !url[end..].starts_with(':') {
        return None;
    }
    Some(&url[..end])
}

/// Whether an inline style may stay.
pub(crate) fn is_safe_style(value: &str) -> bool {
    let normalized = normalize(value);
    let stripped = CSS_COMMENT.replace_all(&normalized, "").replace('\\', "");
    !(stripped.contains("expression(")
        || stripped.contains("url(")
        || stripped.contains("@import")
        || SCRIPT_SCHEMES.iter().any(|scheme| stripped.contains(scheme)))
}

/// Whether the text of an SVG `<style>` element may stay.
pub(crate) fn is_safe_stylesheet(css: &str) -> bool {
    !css.contains('<') && is_safe_style(css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_scheme_obfuscations() {
        assert!(has_script_scheme("javascript:alert(1)"));
        assert!(has_script_scheme(" JavaScript:alert(1)"));
        assert!(has_script_scheme("jav\tascript:alert(1)"));
        assert!(has_script_scheme("jav&#x09;ascript&colon;alert(1)"));
        assert!(has_script_scheme("&#106;avascript:alert(1)"));
        assert!(has_script_scheme("vbscript:msgbox"));
        assert!(!has_script_scheme("https://example.com/javascript"));
    }

    #[test]
    fn test_safe_urls() {
        assert!(is_safe_url("a", "href", "https://example.com"));
        assert!(is_safe_url("a", "href", "#section"));
        assert!(is_safe_url("a", "href", "../docs/page.md"));
        assert!(is_safe_url("a", "href", "mailto:me@example.com"));
        assert!(is_safe_url("a", "href", "/path?q=a:b"));
        assert!(!is_safe_url("a", "href", "javascript:alert(1)"));
        assert!(!is_safe_url("a", "href", "custom-scheme:x"));
    }

    #[test]
    fn test_data_urls_only_on_img_src() {
        assert!(is_safe_url("img", "src", "data:image/png;base64,AAAA"));
        assert!(!is_safe_url("a", "href", "data:text/html,<script>"));
        assert!(!is_safe_url("svg", "xlink:href", "data:image/svg+xml,x"));
    }

    #[test]
    fn test_styles() {
        assert!(is_safe_style("color: red; text-align: center"));
        assert!(!is_safe_style("width: expression(alert(1))"));
        assert!(!is_safe_style("background: url(javascript:x)"));
        assert!(!is_safe_style("background: u/**/rl(x.png)"));
        assert!(!is_safe_style(r"background: u\rl(x.png)"));
    }

    #[test]
    fn test_stylesheets() {
        assert!(is_safe_stylesheet(
            "#mermaid-1{font-family:\"trebuchet ms\";fill:#333;}\n#mermaid-1 .node rect{stroke:#9370DB;}"
        ));
        assert!(!is_safe_stylesheet("@import 'https://evil.example/x.css';"));
        assert!(!is_safe_stylesheet(".a{background:url(https://evil.example/t.png)}"));
        assert!(!is_safe_stylesheet(".a{background:u/*\n*/rl(x.png)}"));
        assert!(!is_safe_stylesheet(".a{}</style><script>x()</script>"));
    }
}
