//! Inline `style` attribute filtering.
//!
//! Declarations are checked one by one against a fixed whitelist of
//! properties and values; everything else is dropped. Keys and values are
//! lowercased and trimmed, and kept declarations are re-serialized as
//! `key: value;` with no separator between them.
use regex::Regex;
use std::sync::LazyLock;

static COLOR_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(rgb|rgba|hsl|hsla)\([0-9%,. ]*\)$").expect("valid color function regex")
});
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-f]{3,6}$").expect("valid hex color regex"));
static COLOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]*$").expect("valid color name regex"));
static LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.]*(px|em|rem|%)$").expect("valid length regex"));
static FONT_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.]*(px|em|%)$").expect("valid font length regex"));

const FONT_SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "larger", "smaller",
];

const VERTICAL_ALIGN_KEYWORDS: &[&str] = &[
    "baseline",
    "sub",
    "super",
    "text-top",
    "text-bottom",
    "middle",
    "top",
    "bottom",
];

fn is_allowed(key: &str, value: &str) -> bool {
    match key {
        "color" | "background-color" => {
            COLOR_FUNCTION.is_match(value)
                || HEX_COLOR.is_match(value)
                || COLOR_NAME.is_match(value)
        }
        "text-align" => matches!(value, "left" | "right" | "center" | "justify"),
        "text-decoration" => matches!(value, "underline" | "line-through"),
        "font-weight" => value == "bold",
        "font-style" => value == "italic",
        "float" => matches!(value, "left" | "right" | "none"),
        "vertical-align" => VERTICAL_ALIGN_KEYWORDS.contains(&value) || FONT_LENGTH.is_match(value),
        "font-size" => FONT_SIZE_KEYWORDS.contains(&value) || FONT_LENGTH.is_match(value),
        "width" | "height" => LENGTH.is_match(value),
        "direction" => matches!(value, "ltr" | "rtl" | "initial" | "inherit"),
        _ => false,
    }
}

/// Filters a `style` attribute value. Returns an empty string when nothing survives.
pub fn filter_styles(style: &str) -> String {
    let mut out = String::new();
    for declaration in style.split(';') {
        let mut parts = declaration.split(':');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_lowercase();
        if is_allowed(&key, &value) {
            out.push_str(&key);
            out.push_str(": ");
            out.push_str(&value);
            out.push(';');
        } else {
            log::trace!(target: "html.sanitize", "dropping style {key}: {value}");
        }
    }
    out
}
