//! Element and attribute tables.
//!
//! The structural tables (void, block, inline, optional end tag, opaque) drive
//! the tokenizer's auto-closing and never change. The whitelist tables are the
//! defaults a [`SanitizerConfig`](crate::SanitizerConfig) starts from.

pub const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "wbr"];

pub const OPTIONAL_END_TAG_BLOCK_ELEMENTS: &[&str] = &[
    "colgroup", "dd", "dt", "li", "p", "tbody", "td", "tfoot", "th", "thead", "tr",
];

pub const OPTIONAL_END_TAG_INLINE_ELEMENTS: &[&str] = &["rp", "rt"];

/// Block elements besides those with optional end tags.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "caption",
    "center",
    "del",
    "dir",
    "div",
    "dl",
    "figure",
    "figcaption",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "ins",
    "map",
    "menu",
    "nav",
    "ol",
    "pre",
    "script",
    "section",
    "table",
    "ul",
];

/// Inline elements besides those with optional end tags.
pub const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdi", "bdo", "big", "br", "cite", "code", "del", "dfn", "em",
    "font", "i", "img", "ins", "kbd", "label", "map", "mark", "q", "ruby", "s", "samp", "small",
    "span", "strike", "strong", "sub", "sup", "time", "tt", "u", "var",
];

/// Elements whose content is raw text, never markup.
pub const OPAQUE_ELEMENTS: &[&str] = &["script", "style"];

/// Attributes holding a URI; their values go through the URI validator.
pub const URI_ATTRIBUTES: &[&str] = &["background", "cite", "href", "longdesc", "src", "usemap"];

pub const GENERIC_ATTRIBUTES: &[&str] = &[
    "abbr",
    "align",
    "alt",
    "axis",
    "bgcolor",
    "border",
    "cellpadding",
    "cellspacing",
    "class",
    "clear",
    "color",
    "cols",
    "colspan",
    "compact",
    "coords",
    "dir",
    "face",
    "headers",
    "height",
    "hreflang",
    "hspace",
    "ismap",
    "lang",
    "language",
    "nohref",
    "nowrap",
    "rel",
    "rev",
    "rows",
    "rowspan",
    "rules",
    "scope",
    "scrolling",
    "shape",
    "size",
    "span",
    "start",
    "summary",
    "target",
    "title",
    "type",
    "valign",
    "value",
    "vspace",
    "width",
];

/// Attribute that marks an `img` as a video placeholder.
pub const VIDEO_PLACEHOLDER_ATTRIBUTE: &str = "ta-insert-video";

/// Per-tag exceptions: `(tag, trigger attribute, extra attributes)`.
///
/// When an element named `tag` carries the trigger attribute, the extra
/// attributes are emitted even though the generic table does not list them.
pub const CUSTOM_ATTRIBUTES: &[(&str, &str, &[&str])] = &[(
    "img",
    VIDEO_PLACEHOLDER_ATTRIBUTE,
    &[
        VIDEO_PLACEHOLDER_ATTRIBUTE,
        "allowfullscreen",
        "frameborder",
        "contenteditable",
    ],
)];

#[inline]
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[inline]
pub fn has_optional_end_tag(name: &str) -> bool {
    OPTIONAL_END_TAG_BLOCK_ELEMENTS.contains(&name)
        || OPTIONAL_END_TAG_INLINE_ELEMENTS.contains(&name)
}

#[inline]
pub fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name) || OPTIONAL_END_TAG_BLOCK_ELEMENTS.contains(&name)
}

#[inline]
pub fn is_inline(name: &str) -> bool {
    INLINE_ELEMENTS.contains(&name) || OPTIONAL_END_TAG_INLINE_ELEMENTS.contains(&name)
}

#[inline]
pub fn is_opaque(name: &str) -> bool {
    OPAQUE_ELEMENTS.contains(&name)
}

/// Every element the default whitelist accepts.
pub fn default_valid_elements() -> impl Iterator<Item = &'static str> {
    VOID_ELEMENTS
        .iter()
        .chain(BLOCK_ELEMENTS)
        .chain(INLINE_ELEMENTS)
        .chain(OPTIONAL_END_TAG_BLOCK_ELEMENTS)
        .chain(OPTIONAL_END_TAG_INLINE_ELEMENTS)
        .copied()
        .filter(|name| !is_opaque(name))
}
