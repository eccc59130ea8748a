//! Built-in default stylesheet

use arbor_css::{CssParser, StyleOrigin, Stylesheet};

/// Display defaults for the stock element set. Anything not listed stays
/// `inline`.
pub const DEFAULT_STYLESHEET: &str = r#"
root, body, div, p, section, header, footer, nav, article, aside,
h1, h2, h3, h4, h5, h6, ul, ol, li, hr, pre, blockquote, button {
    display: block;
}

span, a, b, i, u, s, em, strong, code, small, label, item, icon {
    display: inline;
}

head, script, style, template {
    display: none;
}

h1 { font-size: 20px; bold: true; }
h2 { font-size: 16px; bold: true; }
h3 { font-size: 14px; bold: true; }
b, strong { bold: true; }
i, em { italic: true; }
u { underlined: true; }
s { strikethrough: true; }
hr { height: 1px; margin: 4px 0; }
"#;

/// Compile the default stylesheet with the default origin
pub fn default_stylesheet(parser: &CssParser) -> Stylesheet {
    parser.parse_with_origin(DEFAULT_STYLESHEET, StyleOrigin::Default)
}
