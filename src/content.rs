//! Sanitizing editor content before it reaches the model.
use html::{Sanitizer, default_sanitizer, default_uri_validator};
use regex::Regex;
use std::sync::LazyLock;

static PRE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<pre\b.*?</pre\s*>").expect("valid pre block regex"));
static ENCODED_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:9|10);").expect("valid encoded whitespace regex"));

/// Drops the encoded tabs and newlines the sanitizer emits for source
/// formatting, except inside `<pre>` blocks where they are content.
pub fn strip_encoded_whitespace(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for pre in PRE_BLOCK.find_iter(html) {
        out.push_str(&ENCODED_WHITESPACE.replace_all(&html[last..pre.start()], ""));
        out.push_str(pre.as_str());
        last = pre.end();
    }
    out.push_str(&ENCODED_WHITESPACE.replace_all(&html[last..], ""));
    out
}

/// Sanitizes with `sanitizer`, falling back to `last_good` when the input
/// cannot be tokenized.
pub fn sanitize_with(sanitizer: &Sanitizer, unsafe_html: &str, last_good: &str) -> String {
    match sanitizer.sanitize(unsafe_html, default_uri_validator) {
        Ok(clean) => strip_encoded_whitespace(&clean),
        Err(err) => {
            log::warn!(
                target: "richtext",
                "rejected content at byte {}, keeping last good value: {err}",
                err.position
            );
            last_good.to_string()
        }
    }
}

/// [`sanitize_with`] the default sanitizer.
pub fn sanitize_or_fallback(unsafe_html: &str, last_good: &str) -> String {
    sanitize_with(default_sanitizer(), unsafe_html, last_good)
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::SanitizerConfig;

    #[test]
    fn keeps_safe_markup() {
        assert_eq!(
            sanitize_or_fallback("<p>hi <b>there</b></p>", ""),
            "<p>hi <b>there</b></p>"
        );
    }

    #[test]
    fn drops_scripts_and_handlers() {
        let out = sanitize_or_fallback(
            r#"<p onclick="evil()">a<script>alert(1)</script>b</p>"#,
            "",
        );
        assert_eq!(out, "<p>ab</p>");
    }

    #[test]
    fn unparsable_input_keeps_last_good() {
        assert_eq!(sanitize_or_fallback("<p>x<!-- open", "<p>before</p>"), "<p>before</p>");
    }

    #[test]
    fn encoded_whitespace_survives_only_in_pre() {
        assert_eq!(
            strip_encoded_whitespace("<p>a&#10;b&#9;c</p><PRE>x&#10;y</PRE><p>&#10;</p>"),
            "<p>abc</p><PRE>x&#10;y</PRE><p></p>"
        );
        assert_eq!(
            sanitize_or_fallback("<p>a\nb</p><pre>1\n2</pre>", ""),
            "<p>ab</p><pre>1&#10;2</pre>"
        );
    }

    #[test]
    fn custom_sanitizer() {
        let sanitizer = SanitizerConfig::default().deny_element("b").build();
        assert_eq!(sanitize_with(&sanitizer, "<p><b>x</b></p>", ""), "<p>x</p>");
    }
}
