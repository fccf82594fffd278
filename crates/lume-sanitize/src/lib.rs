//! Allow-list HTML sanitizer.
//!
//! Everything the markdown converter or a diagram engine produces passes
//! through [`Sanitizer::sanitize`] before it reaches the display surface.
//! The sanitizer streams the markup through `lol_html` and:
//!
//! - drops script-executing and raw-text elements (`script`, `iframe`,
//!   `object`, `style`, `xmp`, form controls, ...) together with their content
//! - unwraps unknown elements, keeping their text
//! - removes `on*` handlers, script URLs (also when entity-encoded or split by
//!   whitespace), `data:` URLs outside `img src` and unsafe inline styles
//! - keeps document tags, MathML and structural SVG
//!
//! [`Sanitizer::for_diagrams`] additionally keeps an SVG `<style>` element
//! when its stylesheet imports nothing and loads no URLs, so engine output
//! keeps its colors and fonts.
//!
//! # Example
//!
//! ```
//! use lume_sanitize::Sanitizer;
//!
//! let clean = Sanitizer::new().sanitize(r#"<p onclick="x()">hi</p><script>bad()</script>"#);
//! assert_eq!(clean, "<p>hi</p>");
//! ```

mod allowlist;
mod sanitizer;
mod value;

pub use sanitizer::Sanitizer;
